use crate::artifact::{Model, Preprocessor};
use crate::error::{AppError, Stage};
use crate::inputs::{EMISSION_INDEX_COLUMN, EmissionEstimate, EnvironmentRecord};
use tracing::{debug, warn};

/// Regresses the emission index from the environment and predicted pollutants.
///
/// The raw regressor output is returned unclamped. Values outside `[0, 1]`
/// are logged but passed through.
pub fn predict_index(
    env: &EnvironmentRecord,
    pollutants: &EmissionEstimate,
    preprocessor: &dyn Preprocessor,
    regressor: &dyn Model,
) -> Result<f64, AppError> {
    let combined = env
        .to_record()
        .drop_columns(&[EMISSION_INDEX_COLUMN])
        .concat(pollutants.to_record());
    let features = preprocessor
        .transform(&combined)
        .map_err(|err| AppError::mismatch(Stage::Index, err.to_string()))?;
    let outputs = regressor
        .predict(&features)
        .map_err(|err| AppError::mismatch(Stage::Index, err.to_string()))?;

    let index = match outputs.as_slice() {
        [index] => *index,
        other => {
            return Err(AppError::mismatch(
                Stage::Index,
                format!("regressor returned {} outputs, expected 1", other.len()),
            ));
        }
    };
    if !index.is_finite() {
        return Err(AppError::mismatch(
            Stage::Index,
            format!("regressor returned non-finite index {index}"),
        ));
    }
    if !(0.0..=1.0).contains(&index) {
        warn!(index, "Emission index outside [0, 1]");
    }
    debug!(index, "Emission index");
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::linear::{LinearRegression, LinearRegressionParams};
    use crate::artifact::preprocess::{
        ColumnTransform, ColumnTransformer, ColumnTransformerParams, HandleUnknown,
    };
    use crate::inputs::{EnvironmentInputs, SynthesizedFields};

    const COMBINED_COLUMNS: [&str; 18] = [
        "Vehicle Type",
        "Fuel Type",
        "Engine Size",
        "Age of Vehicle",
        "Mileage",
        "Speed",
        "Acceleration",
        "Road Type",
        "Traffic Conditions",
        "Temperature",
        "Humidity",
        "Wind Speed",
        "Air Pressure",
        "CO2 Emissions",
        "NOx Emissions",
        "PM2.5 Emissions",
        "VOC Emissions",
        "SO2 Emissions",
    ];

    fn names(columns: &[&str]) -> Vec<String> {
        columns.iter().map(|c| c.to_string()).collect()
    }

    fn preprocessor(columns: &[&str]) -> ColumnTransformer {
        ColumnTransformer::new(ColumnTransformerParams {
            feature_names_in: names(columns),
            transformers: vec![
                ColumnTransform::OneHot {
                    column: "Traffic Conditions".to_string(),
                    categories: names(&["Heavy", "Light", "Moderate"]),
                    handle_unknown: HandleUnknown::Error,
                },
                ColumnTransform::Passthrough {
                    columns: names(&["CO2 Emissions", "Wind Speed"]),
                },
            ],
        })
        .expect("valid preprocessor")
    }

    fn regressor(co2_weight: f64, intercept: f64) -> LinearRegression {
        LinearRegression::new(LinearRegressionParams {
            coef: vec![vec![0.0, 0.0, 0.0, co2_weight, 0.0]],
            intercept: vec![intercept],
        })
        .expect("valid regressor")
    }

    fn env() -> EnvironmentRecord {
        EnvironmentRecord::new(
            EnvironmentInputs::default(),
            SynthesizedFields {
                vehicle_age: 5,
                wind_speed: 10.0,
                air_pressure: 1000.0,
            },
        )
    }

    fn pollutants(co2: f64) -> EmissionEstimate {
        EmissionEstimate {
            co2,
            nox: 0.5,
            pm25: 0.05,
            voc: 0.1,
            so2: 0.02,
        }
    }

    #[test]
    fn combines_environment_with_pollutants() -> Result<(), AppError> {
        let index = predict_index(
            &env(),
            &pollutants(200.0),
            &preprocessor(&COMBINED_COLUMNS),
            &regressor(0.001, 0.05),
        )?;

        assert!((index - 0.25).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn out_of_range_index_is_not_clamped() -> Result<(), AppError> {
        let index = predict_index(
            &env(),
            &pollutants(200.0),
            &preprocessor(&COMBINED_COLUMNS),
            &regressor(0.01, 0.0),
        )?;

        assert!((index - 2.0).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn placeholder_target_must_not_be_expected() {
        let mut columns = COMBINED_COLUMNS.to_vec();
        columns.insert(13, "Emission_Index");

        let result = predict_index(
            &env(),
            &pollutants(200.0),
            &preprocessor(&columns),
            &regressor(0.001, 0.0),
        );

        assert!(matches!(
            result,
            Err(AppError::ArtifactMismatch {
                stage: Stage::Index,
                ..
            })
        ));
    }

    #[test]
    fn non_finite_index_is_a_mismatch() {
        let result = predict_index(
            &env(),
            &pollutants(f64::INFINITY),
            &preprocessor(&COMBINED_COLUMNS),
            &regressor(1.0, 0.0),
        );

        assert!(matches!(
            result,
            Err(AppError::ArtifactMismatch {
                stage: Stage::Index,
                ..
            })
        ));
    }
}
