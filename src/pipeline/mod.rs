//! The inference pipeline: fault verdict, pollutant estimate, emission index
//! and emission level for one submission.
//!
//! Stage order: fault and emission are independent, index consumes the
//! emission estimate, level consumes the index. A request either completes
//! every stage or fails with a single error.

use crate::artifact::ArtifactSet;
use crate::error::AppError;
use crate::inputs::{EnvironmentRecord, InferenceResult, VehicleSensorReading};
use tracing::{info, warn};

pub mod emission;
pub mod fault;
pub mod index;
pub mod level;

pub use emission::predict_emissions;
pub use fault::detect_fault;
pub use index::predict_index;
pub use level::{LevelThresholds, classify_level};

/// Immutable after construction; safe to share between requests.
#[derive(Debug, Clone)]
pub struct InferencePipeline {
    artifacts: ArtifactSet,
    thresholds: LevelThresholds,
}

impl InferencePipeline {
    pub fn new(artifacts: ArtifactSet, thresholds: LevelThresholds) -> Self {
        Self {
            artifacts,
            thresholds,
        }
    }

    pub fn artifacts(&self) -> &ArtifactSet {
        &self.artifacts
    }

    pub fn thresholds(&self) -> &LevelThresholds {
        &self.thresholds
    }

    pub fn run(
        &self,
        reading: &VehicleSensorReading,
        env: &EnvironmentRecord,
    ) -> Result<InferenceResult, AppError> {
        let artifacts = &self.artifacts;
        let result = detect_fault(
            reading,
            artifacts.fault_scaler.as_ref(),
            artifacts.fault_classifier.as_ref(),
        )
        .and_then(|fault| {
            let pollutants = predict_emissions(
                env,
                artifacts.emission_preprocessor.as_ref(),
                artifacts.emission_regressor.as_ref(),
            )?;
            let emission_index = predict_index(
                env,
                &pollutants,
                artifacts.index_preprocessor.as_ref(),
                artifacts.index_regressor.as_ref(),
            )?;
            Ok(InferenceResult {
                fault,
                pollutants,
                emission_index,
                level: classify_level(emission_index, &self.thresholds),
            })
        });

        match &result {
            Ok(result) => info!(
                fault = result.fault,
                emission_index = result.emission_index,
                level = ?result.level,
                "Inference complete"
            ),
            Err(err) => warn!(error = %err, "Inference failed"),
        }
        result
    }
}
