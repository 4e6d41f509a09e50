use crate::enrich::EnvironmentEnricher;
use crate::error::AppError;
use crate::inputs::{EnvironmentInputs, EnvironmentRecord, InferenceResult, VehicleSensorReading};
use crate::pipeline::InferencePipeline;

/// Process-wide state shared by all requests. Nothing here is mutated after
/// startup, so it is shared behind a plain `Arc`.
#[derive(Debug)]
pub struct AppState {
    pipeline: InferencePipeline,
    enricher: Box<dyn EnvironmentEnricher>,
}

impl AppState {
    pub fn new(pipeline: InferencePipeline, enricher: Box<dyn EnvironmentEnricher>) -> Self {
        Self { pipeline, enricher }
    }

    pub fn pipeline(&self) -> &InferencePipeline {
        &self.pipeline
    }

    /// Completes the environment record and runs the pipeline on it.
    pub fn infer(
        &self,
        reading: &VehicleSensorReading,
        inputs: EnvironmentInputs,
    ) -> (EnvironmentRecord, Result<InferenceResult, AppError>) {
        let env = self.enricher.enrich(inputs);
        let result = self.pipeline.run(reading, &env);
        (env, result)
    }
}
