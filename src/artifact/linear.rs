//! Linear models: binary logistic classifier and multi-output regressor.

use crate::artifact::{ArtifactError, Model, ShapeMismatch, check_feature_count};
use serde::Deserialize;

fn dot(weights: &[f64], features: &[f64]) -> f64 {
    weights.iter().zip(features).map(|(w, x)| w * x).sum()
}

fn default_classes() -> [f64; 2] {
    [0.0, 1.0]
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogisticRegressionParams {
    pub coef: Vec<f64>,
    pub intercept: f64,
    /// Labels for the negative and positive class.
    #[serde(default = "default_classes")]
    pub classes: [f64; 2],
}

/// Predicts `classes[1]` when the decision function is positive, i.e. when
/// the positive-class probability exceeds 0.5.
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    params: LogisticRegressionParams,
}

impl LogisticRegression {
    pub fn new(params: LogisticRegressionParams) -> Result<Self, ArtifactError> {
        if params.coef.is_empty() {
            return Err(ArtifactError::Invalid(
                "logistic regression has no coefficients".to_string(),
            ));
        }
        if params.coef.iter().any(|c| !c.is_finite()) || !params.intercept.is_finite() {
            return Err(ArtifactError::Invalid(
                "logistic regression weights must be finite".to_string(),
            ));
        }
        Ok(Self { params })
    }

    pub fn decision_function(&self, features: &[f64]) -> f64 {
        dot(&self.params.coef, features) + self.params.intercept
    }

    pub fn probability(&self, features: &[f64]) -> f64 {
        1.0 / (1.0 + (-self.decision_function(features)).exp())
    }
}

impl Model for LogisticRegression {
    fn predict(&self, features: &[f64]) -> Result<Vec<f64>, ShapeMismatch> {
        check_feature_count(features, self.params.coef.len())?;
        let [negative, positive] = self.params.classes;
        let label = if self.decision_function(features) > 0.0 {
            positive
        } else {
            negative
        };
        Ok(vec![label])
    }

    fn n_features_in(&self) -> usize {
        self.params.coef.len()
    }

    fn n_outputs(&self) -> usize {
        1
    }

    fn kind(&self) -> &'static str {
        "logistic_regression"
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinearRegressionParams {
    /// One row of weights per output.
    pub coef: Vec<Vec<f64>>,
    pub intercept: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct LinearRegression {
    params: LinearRegressionParams,
    n_features: usize,
}

impl LinearRegression {
    pub fn new(params: LinearRegressionParams) -> Result<Self, ArtifactError> {
        let n_features = params.coef.first().map(Vec::len).unwrap_or(0);
        if n_features == 0 {
            return Err(ArtifactError::Invalid(
                "linear regression has no coefficients".to_string(),
            ));
        }
        if params.coef.iter().any(|row| row.len() != n_features) {
            return Err(ArtifactError::Invalid(
                "linear regression coefficient rows differ in length".to_string(),
            ));
        }
        if params.intercept.len() != params.coef.len() {
            return Err(ArtifactError::Invalid(format!(
                "linear regression has {} outputs but {} intercepts",
                params.coef.len(),
                params.intercept.len()
            )));
        }
        let mut weights = params.coef.iter().flatten().chain(&params.intercept);
        if weights.any(|w| !w.is_finite()) {
            return Err(ArtifactError::Invalid(
                "linear regression weights must be finite".to_string(),
            ));
        }
        Ok(Self { params, n_features })
    }
}

impl Model for LinearRegression {
    fn predict(&self, features: &[f64]) -> Result<Vec<f64>, ShapeMismatch> {
        check_feature_count(features, self.n_features)?;
        Ok(self
            .params
            .coef
            .iter()
            .zip(&self.params.intercept)
            .map(|(row, intercept)| dot(row, features) + intercept)
            .collect())
    }

    fn n_features_in(&self) -> usize {
        self.n_features
    }

    fn n_outputs(&self) -> usize {
        self.params.coef.len()
    }

    fn kind(&self) -> &'static str {
        "linear_regression"
    }
}
