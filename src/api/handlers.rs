use crate::api::responses::{
    ArtifactKindsResponse, DefaultsResponse, HealthStatus, HealthSuccessResponse,
    PredictErrorCode, PredictErrorResponse, PredictRequest, PredictSuccessResponse,
    ThresholdsResponse,
};
use crate::error::AppError;
use crate::inputs::{EnvironmentInputs, Pollutant, VehicleSensorReading};
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{error, warn};

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Debug)]
enum TimestampError {
    Format(time::error::Format),
}

impl fmt::Display for TimestampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampError::Format(err) => write!(f, "timestamp format error: {err}"),
        }
    }
}

fn format_timestamp(timestamp: SystemTime) -> Result<String, TimestampError> {
    let datetime = OffsetDateTime::from(timestamp);
    datetime.format(&Rfc3339).map_err(TimestampError::Format)
}

fn fallback_timestamp() -> String {
    format_timestamp(SystemTime::now()).unwrap_or_else(|err| {
        error!(error = %err, "Failed to format error timestamp");
        "1970-01-01T00:00:00Z".to_string()
    })
}

pub enum PredictResponse {
    Success(Box<PredictSuccessResponse>),
    Error {
        status: StatusCode,
        body: PredictErrorResponse,
    },
}

impl IntoResponse for PredictResponse {
    fn into_response(self) -> Response {
        match self {
            PredictResponse::Success(body) => (StatusCode::OK, Json(*body)).into_response(),
            PredictResponse::Error { status, body } => (status, Json(body)).into_response(),
        }
    }
}

pub async fn post_predict(
    State(state): State<Arc<AppState>>,
    request: Result<Json<PredictRequest>, JsonRejection>,
) -> impl IntoResponse {
    match request {
        Ok(Json(request)) => build_predict_response(&state, request, SystemTime::now()),
        Err(rejection) => build_rejection_response(&rejection, SystemTime::now()),
    }
}

/// Bodies that do not deserialize are input errors, not artifact mismatches.
fn build_rejection_response(rejection: &JsonRejection, now: SystemTime) -> PredictResponse {
    let timestamp = match format_timestamp(now) {
        Ok(formatted) => formatted,
        Err(_) => return predict_internal_error("timestamp formatting failure"),
    };
    warn!(error = %rejection.body_text(), "Rejected malformed prediction request");
    predict_error(
        StatusCode::BAD_REQUEST,
        PredictErrorCode::InvalidInput,
        rejection.body_text(),
        timestamp,
    )
}

fn build_predict_response(
    state: &AppState,
    request: PredictRequest,
    now: SystemTime,
) -> PredictResponse {
    let timestamp = match format_timestamp(now) {
        Ok(formatted) => formatted,
        Err(_) => return predict_internal_error("timestamp formatting failure"),
    };

    let validation = request
        .sensors
        .validate()
        .and_then(|()| request.environment.validate());
    if let Err(err) = validation {
        warn!(error = %err, "Rejected prediction request");
        return predict_error(
            StatusCode::BAD_REQUEST,
            PredictErrorCode::InvalidInput,
            err.to_string(),
            timestamp,
        );
    }

    let (env, result) = state.infer(&request.sensors, request.environment);
    match result {
        Ok(result) => PredictResponse::Success(Box::new(PredictSuccessResponse {
            fault: result.fault,
            pollutants: result.pollutants,
            pollutant_unit: Pollutant::UNIT,
            emission_index: result.emission_index,
            level: result.level,
            synthesized: env.synthesized,
            timestamp,
        })),
        Err(err @ AppError::ArtifactMismatch { .. }) => predict_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            PredictErrorCode::ArtifactMismatch,
            err.to_string(),
            timestamp,
        ),
        Err(AppError::ArtifactLoad { .. }) => {
            predict_internal_error("artifact load error while serving a request")
        }
    }
}

fn predict_error(
    status: StatusCode,
    error_code: PredictErrorCode,
    error_message: String,
    timestamp: String,
) -> PredictResponse {
    PredictResponse::Error {
        status,
        body: PredictErrorResponse {
            error_code,
            error_message,
            timestamp,
        },
    }
}

fn predict_internal_error(message: &str) -> PredictResponse {
    error!(
        message = message,
        "Internal error while handling /api/predict"
    );
    predict_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        PredictErrorCode::InternalError,
        INTERNAL_ERROR_MESSAGE.to_string(),
        fallback_timestamp(),
    )
}

pub async fn get_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    build_health_response(&state, SystemTime::now())
}

/// Artifacts are loaded all-or-nothing before the server starts, so a running
/// server is always healthy.
fn build_health_response(state: &AppState, now: SystemTime) -> Response {
    let timestamp = match format_timestamp(now) {
        Ok(formatted) => formatted,
        Err(err) => {
            error!(error = %err, "Internal error while handling /api/health");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let pipeline = state.pipeline();
    let artifacts = pipeline.artifacts();
    let thresholds = pipeline.thresholds();
    let body = HealthSuccessResponse {
        status: HealthStatus::Ok,
        artifacts: ArtifactKindsResponse {
            fault_scaler: artifacts.fault_scaler.kind(),
            fault_classifier: artifacts.fault_classifier.kind(),
            emission_preprocessor: artifacts.emission_preprocessor.kind(),
            emission_regressor: artifacts.emission_regressor.kind(),
            index_preprocessor: artifacts.index_preprocessor.kind(),
            index_regressor: artifacts.index_regressor.kind(),
        },
        thresholds: ThresholdsResponse {
            low: thresholds.low(),
            medium: thresholds.medium(),
        },
        timestamp,
    };
    (StatusCode::OK, Json(body)).into_response()
}

pub async fn get_defaults() -> Json<DefaultsResponse> {
    Json(DefaultsResponse {
        sensors: VehicleSensorReading::default(),
        environment: EnvironmentInputs::default(),
    })
}
