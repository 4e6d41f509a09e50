use crate::artifact::{Model, Preprocessor};
use crate::error::{AppError, Stage};
use crate::inputs::{EMISSION_INDEX_COLUMN, EmissionEstimate, EnvironmentRecord};
use tracing::{debug, warn};

/// Columns the emission preprocessor was not fitted on.
pub const EMISSION_DROPPED_COLUMNS: [&str; 5] = [
    "Vehicle Type",
    "Traffic Conditions",
    "Wind Speed",
    "Air Pressure",
    EMISSION_INDEX_COLUMN,
];

pub fn predict_emissions(
    env: &EnvironmentRecord,
    preprocessor: &dyn Preprocessor,
    regressor: &dyn Model,
) -> Result<EmissionEstimate, AppError> {
    let record = env.to_record().drop_columns(&EMISSION_DROPPED_COLUMNS);
    let features = preprocessor
        .transform(&record)
        .map_err(|err| AppError::mismatch(Stage::Emission, err.to_string()))?;
    let outputs = regressor
        .predict(&features)
        .map_err(|err| AppError::mismatch(Stage::Emission, err.to_string()))?;

    let estimate = EmissionEstimate::from_slice(&outputs).ok_or_else(|| {
        AppError::mismatch(
            Stage::Emission,
            format!("regressor returned {} outputs, expected 5", outputs.len()),
        )
    })?;
    for (pollutant, value) in estimate.iter() {
        if !value.is_finite() {
            return Err(AppError::mismatch(
                Stage::Emission,
                format!(
                    "regressor returned non-finite {} {value}",
                    pollutant.display_name()
                ),
            ));
        }
        if value < 0.0 {
            warn!(
                pollutant = pollutant.display_name(),
                value, "Negative pollutant prediction"
            );
        }
    }
    debug!(?estimate, "Emission estimate");
    Ok(estimate)
}
