//! Fitted preprocessors: standardization and per-column transformers.

use crate::artifact::{ArtifactError, Preprocessor, ShapeMismatch};
use crate::record::{Record, Value};
use serde::Deserialize;
use std::collections::HashSet;

/// Verifies that `record` has exactly the fitted columns, in fitted order.
pub(crate) fn check_columns(expected: &[String], record: &Record) -> Result<(), ShapeMismatch> {
    let actual: Vec<&str> = record.columns().collect();

    let missing: Vec<&str> = expected
        .iter()
        .map(String::as_str)
        .filter(|name| !actual.contains(name))
        .collect();
    let unexpected: Vec<&str> = actual
        .iter()
        .copied()
        .filter(|name| !expected.iter().any(|e| e == name))
        .collect();
    if !missing.is_empty() || !unexpected.is_empty() {
        return Err(ShapeMismatch(format!(
            "column set differs from fitted input (missing: {missing:?}, unexpected: {unexpected:?})"
        )));
    }
    if actual.len() != expected.len() {
        return Err(ShapeMismatch(format!(
            "expected {} columns, got {}",
            expected.len(),
            actual.len()
        )));
    }

    for (position, (fitted, given)) in expected.iter().zip(&actual).enumerate() {
        if fitted != given {
            return Err(ShapeMismatch(format!(
                "column {position} is {given:?}, fitted on {fitted:?}"
            )));
        }
    }
    Ok(())
}

fn number(record: &Record, column: &str) -> Result<f64, ShapeMismatch> {
    match record.get(column) {
        Some(Value::Number(value)) => Ok(*value),
        Some(other) => Err(ShapeMismatch(format!(
            "column {column:?} expects a number, got {other}"
        ))),
        None => Err(ShapeMismatch(format!("missing column {column:?}"))),
    }
}

fn category<'a>(record: &'a Record, column: &str) -> Result<&'a str, ShapeMismatch> {
    match record.get(column) {
        Some(Value::Category(value)) => Ok(value),
        Some(other) => Err(ShapeMismatch(format!(
            "column {column:?} expects a category, got {other}"
        ))),
        None => Err(ShapeMismatch(format!("missing column {column:?}"))),
    }
}

fn validate_scaling(columns: usize, mean: &[f64], scale: &[f64]) -> Result<(), ArtifactError> {
    if mean.len() != columns || scale.len() != columns {
        return Err(ArtifactError::Invalid(format!(
            "scaler has {columns} columns but {} means and {} scales",
            mean.len(),
            scale.len()
        )));
    }
    if mean.iter().any(|m| !m.is_finite()) {
        return Err(ArtifactError::Invalid("scaler mean must be finite".to_string()));
    }
    if scale.iter().any(|s| !s.is_finite() || *s == 0.0) {
        return Err(ArtifactError::Invalid(
            "scaler scale must be finite and non-zero".to_string(),
        ));
    }
    Ok(())
}

fn validate_unique(names: &[String]) -> Result<(), ArtifactError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name.as_str()) {
            return Err(ArtifactError::Invalid(format!("duplicate column {name:?}")));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
pub struct StandardScalerParams {
    pub feature_names: Vec<String>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// `(x - mean) / scale` per column, on an all-numeric record.
#[derive(Debug, Clone)]
pub struct StandardScaler {
    params: StandardScalerParams,
}

impl StandardScaler {
    pub fn new(params: StandardScalerParams) -> Result<Self, ArtifactError> {
        if params.feature_names.is_empty() {
            return Err(ArtifactError::Invalid("scaler has no columns".to_string()));
        }
        validate_unique(&params.feature_names)?;
        validate_scaling(params.feature_names.len(), &params.mean, &params.scale)?;
        Ok(Self { params })
    }
}

impl Preprocessor for StandardScaler {
    fn transform(&self, record: &Record) -> Result<Vec<f64>, ShapeMismatch> {
        check_columns(&self.params.feature_names, record)?;
        self.params
            .feature_names
            .iter()
            .zip(self.params.mean.iter().zip(&self.params.scale))
            .map(|(column, (mean, scale))| number(record, column).map(|x| (x - mean) / scale))
            .collect()
    }

    fn feature_names_in(&self) -> &[String] {
        &self.params.feature_names
    }

    fn n_features_out(&self) -> usize {
        self.params.feature_names.len()
    }

    fn kind(&self) -> &'static str {
        "standard_scaler"
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleUnknown {
    #[default]
    Error,
    /// Unknown categories encode as all zeros.
    Ignore,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColumnTransform {
    OneHot {
        column: String,
        categories: Vec<String>,
        #[serde(default)]
        handle_unknown: HandleUnknown,
    },
    StandardScaler {
        columns: Vec<String>,
        mean: Vec<f64>,
        scale: Vec<f64>,
    },
    Passthrough {
        columns: Vec<String>,
    },
}

impl ColumnTransform {
    fn columns(&self) -> Vec<&str> {
        match self {
            ColumnTransform::OneHot { column, .. } => vec![column.as_str()],
            ColumnTransform::StandardScaler { columns, .. }
            | ColumnTransform::Passthrough { columns } => {
                columns.iter().map(String::as_str).collect()
            }
        }
    }

    fn width(&self) -> usize {
        match self {
            ColumnTransform::OneHot { categories, .. } => categories.len(),
            ColumnTransform::StandardScaler { columns, .. }
            | ColumnTransform::Passthrough { columns } => columns.len(),
        }
    }

    fn validate(&self) -> Result<(), ArtifactError> {
        match self {
            ColumnTransform::OneHot {
                column, categories, ..
            } => {
                if categories.is_empty() {
                    return Err(ArtifactError::Invalid(format!(
                        "one-hot encoder for {column:?} has no categories"
                    )));
                }
                validate_unique(categories)
            }
            ColumnTransform::StandardScaler {
                columns,
                mean,
                scale,
            } => validate_scaling(columns.len(), mean, scale),
            ColumnTransform::Passthrough { .. } => Ok(()),
        }
    }

    fn apply(&self, record: &Record, out: &mut Vec<f64>) -> Result<(), ShapeMismatch> {
        match self {
            ColumnTransform::OneHot {
                column,
                categories,
                handle_unknown,
            } => {
                let value = category(record, column)?;
                let position = categories.iter().position(|c| c == value);
                if position.is_none() && *handle_unknown == HandleUnknown::Error {
                    return Err(ShapeMismatch(format!(
                        "unknown category {value:?} for column {column:?}"
                    )));
                }
                out.extend((0..categories.len()).map(|i| {
                    if Some(i) == position { 1.0 } else { 0.0 }
                }));
            }
            ColumnTransform::StandardScaler {
                columns,
                mean,
                scale,
            } => {
                for ((column, mean), scale) in columns.iter().zip(mean).zip(scale) {
                    out.push((number(record, column)? - mean) / scale);
                }
            }
            ColumnTransform::Passthrough { columns } => {
                for column in columns {
                    out.push(number(record, column)?);
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnTransformerParams {
    pub feature_names_in: Vec<String>,
    pub transformers: Vec<ColumnTransform>,
}

/// Applies each transformer to its columns and concatenates the outputs in
/// transformer order. Columns no transformer claims are dropped.
#[derive(Debug, Clone)]
pub struct ColumnTransformer {
    params: ColumnTransformerParams,
    width: usize,
}

impl ColumnTransformer {
    pub fn new(params: ColumnTransformerParams) -> Result<Self, ArtifactError> {
        if params.transformers.is_empty() {
            return Err(ArtifactError::Invalid(
                "column transformer has no transformers".to_string(),
            ));
        }
        validate_unique(&params.feature_names_in)?;
        for transform in &params.transformers {
            transform.validate()?;
            for column in transform.columns() {
                if !params.feature_names_in.iter().any(|name| name == column) {
                    return Err(ArtifactError::Invalid(format!(
                        "transformer references unknown column {column:?}"
                    )));
                }
            }
        }
        let width = params.transformers.iter().map(ColumnTransform::width).sum();
        Ok(Self { params, width })
    }
}

impl Preprocessor for ColumnTransformer {
    fn transform(&self, record: &Record) -> Result<Vec<f64>, ShapeMismatch> {
        check_columns(&self.params.feature_names_in, record)?;
        let mut out = Vec::with_capacity(self.width);
        for transform in &self.params.transformers {
            transform.apply(record, &mut out)?;
        }
        Ok(out)
    }

    fn feature_names_in(&self) -> &[String] {
        &self.params.feature_names_in
    }

    fn n_features_out(&self) -> usize {
        self.width
    }

    fn kind(&self) -> &'static str {
        "column_transformer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(columns: &[&str]) -> Vec<String> {
        columns.iter().map(|c| c.to_string()).collect()
    }

    fn scaler() -> StandardScaler {
        StandardScaler::new(StandardScalerParams {
            feature_names: names(&["rpm", "temp"]),
            mean: vec![1000.0, 80.0],
            scale: vec![500.0, 10.0],
        })
        .expect("valid scaler")
    }

    fn transformer(handle_unknown: HandleUnknown) -> ColumnTransformer {
        ColumnTransformer::new(ColumnTransformerParams {
            feature_names_in: names(&["Fuel Type", "Speed", "Humidity", "Wind Speed"]),
            transformers: vec![
                ColumnTransform::OneHot {
                    column: "Fuel Type".to_string(),
                    categories: names(&["Diesel", "Electric", "Petrol"]),
                    handle_unknown,
                },
                ColumnTransform::StandardScaler {
                    columns: names(&["Speed"]),
                    mean: vec![50.0],
                    scale: vec![25.0],
                },
                ColumnTransform::Passthrough {
                    columns: names(&["Humidity"]),
                },
            ],
        })
        .expect("valid transformer")
    }

    fn env_record(fuel: &str) -> Record {
        Record::new()
            .with_category("Fuel Type", fuel)
            .with_number("Speed", 100.0)
            .with_number("Humidity", 40.0)
            .with_number("Wind Speed", 3.0)
    }

    #[test]
    fn scaler_standardizes_each_column() -> Result<(), ShapeMismatch> {
        let record = Record::new()
            .with_number("rpm", 2000.0)
            .with_number("temp", 75.0);

        let features = scaler().transform(&record)?;

        assert_eq!(features, vec![2.0, -0.5]);
        Ok(())
    }

    #[test]
    fn scaler_rejects_permuted_columns() {
        let record = Record::new()
            .with_number("temp", 75.0)
            .with_number("rpm", 2000.0);

        let result = scaler().transform(&record);

        let err = result.expect_err("permuted columns must be rejected");
        assert!(err.0.contains("column 0"), "unexpected message: {err}");
    }

    #[test]
    fn scaler_rejects_missing_columns() {
        let record = Record::new().with_number("rpm", 2000.0);

        let err = scaler().transform(&record).expect_err("missing column");

        assert!(err.0.contains("temp"), "unexpected message: {err}");
    }

    #[test]
    fn scaler_rejects_categorical_values() {
        let record = Record::new()
            .with_category("rpm", "high")
            .with_number("temp", 75.0);

        assert!(scaler().transform(&record).is_err());
    }

    #[test]
    fn scaler_rejects_zero_scale_at_load() {
        let result = StandardScaler::new(StandardScalerParams {
            feature_names: names(&["a"]),
            mean: vec![0.0],
            scale: vec![0.0],
        });

        assert!(matches!(result, Err(ArtifactError::Invalid(_))));
    }

    #[test]
    fn scaler_rejects_length_disagreement_at_load() {
        let result = StandardScaler::new(StandardScalerParams {
            feature_names: names(&["a", "b"]),
            mean: vec![0.0],
            scale: vec![1.0, 1.0],
        });

        assert!(matches!(result, Err(ArtifactError::Invalid(_))));
    }

    #[test]
    fn column_transformer_concatenates_in_transformer_order() -> Result<(), ShapeMismatch> {
        let features = transformer(HandleUnknown::Error).transform(&env_record("Petrol"))?;

        assert_eq!(features, vec![0.0, 0.0, 1.0, 2.0, 40.0]);
        Ok(())
    }

    #[test]
    fn column_transformer_reports_output_width() {
        assert_eq!(transformer(HandleUnknown::Error).n_features_out(), 5);
    }

    #[test]
    fn unknown_category_errors_by_default() {
        let result = transformer(HandleUnknown::Error).transform(&env_record("Hydrogen"));

        assert!(result.is_err());
    }

    #[test]
    fn unknown_category_can_encode_as_zeros() -> Result<(), ShapeMismatch> {
        let features = transformer(HandleUnknown::Ignore).transform(&env_record("Hydrogen"))?;

        assert_eq!(&features[..3], &[0.0, 0.0, 0.0]);
        Ok(())
    }

    #[test]
    fn column_transformer_rejects_extra_columns() {
        let record = env_record("Diesel").with_number("Emission_Index", 0.0);

        let err = transformer(HandleUnknown::Error)
            .transform(&record)
            .expect_err("extra column");

        assert!(err.0.contains("Emission_Index"), "unexpected message: {err}");
    }

    #[test]
    fn column_transformer_rejects_unknown_reference_at_load() {
        let result = ColumnTransformer::new(ColumnTransformerParams {
            feature_names_in: names(&["Speed"]),
            transformers: vec![ColumnTransform::Passthrough {
                columns: names(&["Mileage"]),
            }],
        });

        assert!(matches!(result, Err(ArtifactError::Invalid(_))));
    }

    #[test]
    fn transforms_deserialize_by_type_tag() -> Result<(), serde_json::Error> {
        let transform: ColumnTransform = serde_json::from_str(
            r#"{"type": "one_hot", "column": "Road Type", "categories": ["City", "Highway"]}"#,
        )?;

        assert!(matches!(
            transform,
            ColumnTransform::OneHot {
                handle_unknown: HandleUnknown::Error,
                ..
            }
        ));
        Ok(())
    }
}
