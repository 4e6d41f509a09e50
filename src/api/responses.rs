use crate::inputs::{
    EmissionEstimate, EmissionLevel, EnvironmentInputs, SynthesizedFields, VehicleSensorReading,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub sensors: VehicleSensorReading,
    pub environment: EnvironmentInputs,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PredictSuccessResponse {
    pub fault: bool,
    pub pollutants: EmissionEstimate,
    pub pollutant_unit: &'static str,
    pub emission_index: f64,
    pub level: EmissionLevel,
    /// Values drawn for the fields the user does not supply.
    pub synthesized: SynthesizedFields,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PredictErrorResponse {
    pub error_code: PredictErrorCode,
    pub error_message: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PredictErrorCode {
    InvalidInput,
    ArtifactMismatch,
    InternalError,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ArtifactKindsResponse {
    pub fault_scaler: &'static str,
    pub fault_classifier: &'static str,
    pub emission_preprocessor: &'static str,
    pub emission_regressor: &'static str,
    pub index_preprocessor: &'static str,
    pub index_regressor: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ThresholdsResponse {
    pub low: f64,
    pub medium: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthSuccessResponse {
    pub status: HealthStatus,
    pub artifacts: ArtifactKindsResponse,
    pub thresholds: ThresholdsResponse,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct DefaultsResponse {
    pub sensors: VehicleSensorReading,
    pub environment: EnvironmentInputs,
}
