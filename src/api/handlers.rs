use crate::api::ApiContext;
use crate::api::responses::{
    ErrorCode, ErrorResponse, HealthStatus, HealthSuccessResponse, ParkingSuccessResponse,
    UpdateParkingRequest,
};
use crate::prediction::{local_now, parse_local_timestamp};
use crate::service::{LotPrediction, ParkingService};
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::fmt;
use std::sync::RwLock;
use std::time::SystemTime;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{error, info, warn};

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

pub enum UpdateResponse {
    Success(Vec<LotPrediction>),
    Error {
        status: StatusCode,
        body: ErrorResponse,
    },
}

impl IntoResponse for UpdateResponse {
    fn into_response(self) -> Response {
        match self {
            UpdateResponse::Success(lots) => (StatusCode::OK, Json(lots)).into_response(),
            UpdateResponse::Error { status, body } => (status, Json(body)).into_response(),
        }
    }
}

pub async fn update_parking(
    State(context): State<ApiContext>,
    Json(request): Json<UpdateParkingRequest>,
) -> impl IntoResponse {
    build_update_response(&context.service, request).await
}

pub enum ParkingResponse {
    Success(ParkingSuccessResponse),
    Error {
        status: StatusCode,
        body: ErrorResponse,
    },
}

impl IntoResponse for ParkingResponse {
    fn into_response(self) -> Response {
        match self {
            ParkingResponse::Success(body) => (StatusCode::OK, Json(body)).into_response(),
            ParkingResponse::Error { status, body } => (status, Json(body)).into_response(),
        }
    }
}

pub async fn get_parking(State(context): State<ApiContext>) -> impl IntoResponse {
    build_parking_response(&context.state)
}

pub enum HealthResponse {
    Success {
        status: StatusCode,
        body: HealthSuccessResponse,
    },
    Error {
        status: StatusCode,
        body: ErrorResponse,
    },
}

impl IntoResponse for HealthResponse {
    fn into_response(self) -> Response {
        match self {
            HealthResponse::Success { status, body } => (status, Json(body)).into_response(),
            HealthResponse::Error { status, body } => (status, Json(body)).into_response(),
        }
    }
}

pub async fn get_health(State(context): State<ApiContext>) -> impl IntoResponse {
    build_health_response(&context.state, SystemTime::now())
}

async fn build_update_response(
    service: &ParkingService,
    request: UpdateParkingRequest,
) -> UpdateResponse {
    let timestamp = match request.timestamp.as_deref() {
        Some(raw) => match parse_local_timestamp(raw, service.utc_offset()) {
            Ok(timestamp) => timestamp,
            Err(err) => {
                warn!(error = %err, "Rejected /update_parking request");
                return UpdateResponse::Error {
                    status: StatusCode::BAD_REQUEST,
                    body: error_body(ErrorCode::InvalidTimestamp, err.to_string()),
                };
            }
        },
        None => local_now(service.utc_offset()),
    };

    match service
        .predict_area(request.latitude, request.longitude, timestamp)
        .await
    {
        Ok(snapshot) => {
            info!(
                lots = snapshot.lots.len(),
                latitude = request.latitude,
                longitude = request.longitude,
                "Area prediction served"
            );
            UpdateResponse::Success(snapshot.lots)
        }
        Err(err) => {
            error!(error = %err, "Internal error while handling /update_parking");
            UpdateResponse::Error {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: error_body(ErrorCode::InternalError, INTERNAL_ERROR_MESSAGE.to_string()),
            }
        }
    }
}

fn build_parking_response(state: &RwLock<AppState>) -> ParkingResponse {
    let guard = match state.read() {
        Ok(guard) => guard,
        Err(_) => {
            return ParkingResponse::Error {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: internal_error("/api/parking", "state lock poisoned while reading snapshot"),
            };
        }
    };
    let snapshot = guard.snapshot().cloned();
    drop(guard);

    let Some(snapshot) = snapshot else {
        return ParkingResponse::Error {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: error_body(
                ErrorCode::NoData,
                "No parking snapshot available".to_string(),
            ),
        };
    };

    match format_timestamp(snapshot.generated_at) {
        Ok(timestamp) => ParkingResponse::Success(ParkingSuccessResponse {
            lots: snapshot.lots,
            timestamp,
        }),
        Err(_) => ParkingResponse::Error {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: internal_error("/api/parking", "timestamp formatting failure"),
        },
    }
}

fn build_health_response(state: &RwLock<AppState>, now: SystemTime) -> HealthResponse {
    let guard = match state.read() {
        Ok(guard) => guard,
        Err(_) => {
            return HealthResponse::Error {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: internal_error("/api/health", "state lock poisoned while reading snapshot"),
            };
        }
    };

    let status = match guard.snapshot() {
        Some(snapshot) if snapshot.weather_available => HealthStatus::Ok,
        Some(_) => HealthStatus::Degraded,
        None => HealthStatus::Ko,
    };
    drop(guard);

    let timestamp = match format_timestamp(now) {
        Ok(formatted) => formatted,
        Err(_) => {
            return HealthResponse::Error {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: internal_error("/api/health", "timestamp formatting failure"),
            };
        }
    };

    let status_code = match status {
        HealthStatus::Ko => StatusCode::SERVICE_UNAVAILABLE,
        HealthStatus::Ok | HealthStatus::Degraded => StatusCode::OK,
    };

    HealthResponse::Success {
        status: status_code,
        body: HealthSuccessResponse { status, timestamp },
    }
}

fn error_body(error_code: ErrorCode, error_message: String) -> ErrorResponse {
    ErrorResponse {
        error_code,
        error_message,
        timestamp: now_timestamp(),
    }
}

fn internal_error(route: &str, message: &str) -> ErrorResponse {
    error!(route, message, "Internal error while handling request");
    error_body(ErrorCode::InternalError, INTERNAL_ERROR_MESSAGE.to_string())
}

fn now_timestamp() -> String {
    format_timestamp(SystemTime::now()).unwrap_or_else(|err| {
        error!(error = %err, "Failed to format response timestamp");
        OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
    })
}

fn format_timestamp(timestamp: SystemTime) -> Result<String, TimestampError> {
    let datetime = OffsetDateTime::from(timestamp);
    datetime.format(&Rfc3339).map_err(TimestampError::Format)
}
