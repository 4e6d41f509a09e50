use crate::artifact::{Model, Preprocessor};
use crate::error::{AppError, Stage};
use crate::inputs::VehicleSensorReading;
use tracing::debug;

const NO_FAULT_LABEL: f64 = 0.0;
const FAULT_LABEL: f64 = 1.0;

/// Scales the six sensor readings and classifies them; label `1` is a fault.
pub fn detect_fault(
    reading: &VehicleSensorReading,
    scaler: &dyn Preprocessor,
    classifier: &dyn Model,
) -> Result<bool, AppError> {
    let scaled = scaler
        .transform(&reading.to_record())
        .map_err(|err| AppError::mismatch(Stage::Fault, err.to_string()))?;
    let prediction = classifier
        .predict(&scaled)
        .map_err(|err| AppError::mismatch(Stage::Fault, err.to_string()))?;

    let label = match prediction.as_slice() {
        [label] => *label,
        other => {
            return Err(AppError::mismatch(
                Stage::Fault,
                format!("classifier returned {} outputs, expected 1", other.len()),
            ));
        }
    };
    debug!(label, "Fault classifier label");

    if label == FAULT_LABEL {
        Ok(true)
    } else if label == NO_FAULT_LABEL {
        Ok(false)
    } else {
        Err(AppError::mismatch(
            Stage::Fault,
            format!("classifier returned unknown label {label}"),
        ))
    }
}
