//! Pre-trained artifacts: fitted preprocessors and models.
//!
//! Every artifact is a JSON file of the form `{ "kind": ..., "params": ... }`.
//! The `kind` selects the implementation and `params` carries its fitted
//! state. Artifacts are immutable once loaded and are shared read-only by all
//! requests.

use crate::error::AppError;
use crate::record::Record;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

pub mod linear;
pub mod preprocess;
pub mod tree;

use linear::{
    LinearRegression, LinearRegressionParams, LogisticRegression, LogisticRegressionParams,
};
use preprocess::{ColumnTransformer, ColumnTransformerParams, StandardScaler, StandardScalerParams};
use tree::{TreeEnsemble, TreeEnsembleParams};

/// Input disagreed with what an artifact was fitted on.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{0}")]
pub struct ShapeMismatch(pub String);

/// Turns a tabular record into a numeric feature vector.
pub trait Preprocessor: Send + Sync + fmt::Debug {
    fn transform(&self, record: &Record) -> Result<Vec<f64>, ShapeMismatch>;

    /// Columns the preprocessor was fitted on, in order.
    fn feature_names_in(&self) -> &[String];

    fn n_features_out(&self) -> usize;

    fn kind(&self) -> &'static str;
}

/// Maps a feature vector to one or more outputs.
///
/// Classifiers return a single class label.
pub trait Model: Send + Sync + fmt::Debug {
    fn predict(&self, features: &[f64]) -> Result<Vec<f64>, ShapeMismatch>;

    fn n_features_in(&self) -> usize;

    fn n_outputs(&self) -> usize;

    fn kind(&self) -> &'static str;
}

pub(crate) fn check_feature_count(features: &[f64], expected: usize) -> Result<(), ShapeMismatch> {
    if features.len() != expected {
        return Err(ShapeMismatch(format!(
            "expected {expected} features, got {}",
            features.len()
        )));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct ArtifactFile {
    pub kind: String,
    pub params: serde_json::Value,
}

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read artifact file: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse artifact file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid artifact: {0}")]
    Invalid(String),
}

pub fn create_preprocessor(file: &ArtifactFile) -> Result<Box<dyn Preprocessor>, ArtifactError> {
    match file.kind.as_str() {
        "standard_scaler" => {
            let params: StandardScalerParams = serde_json::from_value(file.params.clone())?;
            Ok(Box::new(StandardScaler::new(params)?))
        }
        "column_transformer" => {
            let params: ColumnTransformerParams = serde_json::from_value(file.params.clone())?;
            Ok(Box::new(ColumnTransformer::new(params)?))
        }
        other => Err(ArtifactError::Invalid(format!("unknown preprocessor: {other}"))),
    }
}

pub fn create_model(file: &ArtifactFile) -> Result<Box<dyn Model>, ArtifactError> {
    match file.kind.as_str() {
        "logistic_regression" => {
            let params: LogisticRegressionParams = serde_json::from_value(file.params.clone())?;
            Ok(Box::new(LogisticRegression::new(params)?))
        }
        "linear_regression" => {
            let params: LinearRegressionParams = serde_json::from_value(file.params.clone())?;
            Ok(Box::new(LinearRegression::new(params)?))
        }
        "tree_ensemble" => {
            let params: TreeEnsembleParams = serde_json::from_value(file.params.clone())?;
            Ok(Box::new(TreeEnsemble::new(params)?))
        }
        other => Err(ArtifactError::Invalid(format!("unknown model: {other}"))),
    }
}

fn read_artifact_file(path: &Path) -> Result<ArtifactFile, ArtifactError> {
    let contents = std::fs::read_to_string(path)?;
    let file: ArtifactFile = serde_json::from_str(&contents)?;
    Ok(file)
}

pub fn load_preprocessor_from_path(
    path: impl AsRef<Path>,
) -> Result<Box<dyn Preprocessor>, ArtifactError> {
    create_preprocessor(&read_artifact_file(path.as_ref())?)
}

pub fn load_model_from_path(path: impl AsRef<Path>) -> Result<Box<dyn Model>, ArtifactError> {
    create_model(&read_artifact_file(path.as_ref())?)
}

/// Locations of the six artifact files.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactPaths {
    pub fault_scaler: PathBuf,
    pub fault_classifier: PathBuf,
    pub emission_preprocessor: PathBuf,
    pub emission_regressor: PathBuf,
    pub index_preprocessor: PathBuf,
    pub index_regressor: PathBuf,
}

pub const DEFAULT_FAULT_SCALER_FILE: &str = "feature_scaler.json";
pub const DEFAULT_FAULT_CLASSIFIER_FILE: &str = "fault_detector.json";
pub const DEFAULT_EMISSION_PREPROCESSOR_FILE: &str = "emission_prediction_preprocessor.json";
pub const DEFAULT_EMISSION_REGRESSOR_FILE: &str = "emission_prediction_rf_multi.json";
pub const DEFAULT_INDEX_PREPROCESSOR_FILE: &str = "emission_index_preprocessor.json";
pub const DEFAULT_INDEX_REGRESSOR_FILE: &str = "emission_index_xgb_model.json";

impl ArtifactPaths {
    /// Default file names inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            fault_scaler: dir.join(DEFAULT_FAULT_SCALER_FILE),
            fault_classifier: dir.join(DEFAULT_FAULT_CLASSIFIER_FILE),
            emission_preprocessor: dir.join(DEFAULT_EMISSION_PREPROCESSOR_FILE),
            emission_regressor: dir.join(DEFAULT_EMISSION_REGRESSOR_FILE),
            index_preprocessor: dir.join(DEFAULT_INDEX_PREPROCESSOR_FILE),
            index_regressor: dir.join(DEFAULT_INDEX_REGRESSOR_FILE),
        }
    }
}

/// The six fitted artifacts the pipeline runs on.
#[derive(Debug, Clone)]
pub struct ArtifactSet {
    pub fault_scaler: Arc<dyn Preprocessor>,
    pub fault_classifier: Arc<dyn Model>,
    pub emission_preprocessor: Arc<dyn Preprocessor>,
    pub emission_regressor: Arc<dyn Model>,
    pub index_preprocessor: Arc<dyn Preprocessor>,
    pub index_regressor: Arc<dyn Model>,
}

fn load_preprocessor(
    artifact: &'static str,
    path: &Path,
) -> Result<Arc<dyn Preprocessor>, AppError> {
    let preprocessor = load_preprocessor_from_path(path).map_err(|source| AppError::ArtifactLoad {
        artifact,
        path: path.to_path_buf(),
        source,
    })?;
    info!(artifact, kind = preprocessor.kind(), path = %path.display(), "Artifact loaded");
    Ok(Arc::from(preprocessor))
}

fn load_model(artifact: &'static str, path: &Path) -> Result<Arc<dyn Model>, AppError> {
    let model = load_model_from_path(path).map_err(|source| AppError::ArtifactLoad {
        artifact,
        path: path.to_path_buf(),
        source,
    })?;
    info!(artifact, kind = model.kind(), path = %path.display(), "Artifact loaded");
    Ok(Arc::from(model))
}

impl ArtifactSet {
    /// Loads all six artifacts. The first failure aborts the whole load.
    pub fn load(paths: &ArtifactPaths) -> Result<Self, AppError> {
        let set = Self {
            fault_scaler: load_preprocessor("fault scaler", &paths.fault_scaler)?,
            fault_classifier: load_model("fault classifier", &paths.fault_classifier)?,
            emission_preprocessor: load_preprocessor(
                "emission preprocessor",
                &paths.emission_preprocessor,
            )?,
            emission_regressor: load_model("emission regressor", &paths.emission_regressor)?,
            index_preprocessor: load_preprocessor("index preprocessor", &paths.index_preprocessor)?,
            index_regressor: load_model("index regressor", &paths.index_regressor)?,
        };
        set.warn_on_incompatible_shapes();
        Ok(set)
    }

    /// Shape disagreements surface per request as mismatches; they are only
    /// logged here.
    fn warn_on_incompatible_shapes(&self) {
        let pairs: [(&str, &dyn Preprocessor, &dyn Model); 3] = [
            ("fault", self.fault_scaler.as_ref(), self.fault_classifier.as_ref()),
            (
                "emission",
                self.emission_preprocessor.as_ref(),
                self.emission_regressor.as_ref(),
            ),
            ("index", self.index_preprocessor.as_ref(), self.index_regressor.as_ref()),
        ];
        for (stage, preprocessor, model) in pairs {
            if preprocessor.n_features_out() != model.n_features_in() {
                warn!(
                    stage,
                    produced = preprocessor.n_features_out(),
                    expected = model.n_features_in(),
                    "Preprocessor output width does not match model input width"
                );
            }
        }
    }
}
