/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers should return `Result<T, ApiError>` which automatically
/// converts to appropriate HTTP status codes.
///
/// Messages from the identity service and table store reach the client
/// verbatim; infrastructure failures are logged and answered generically.
///
/// # Example
///
/// ```
/// use passabola_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::json;
///
/// async fn handler() -> ApiResult<Json<serde_json::Value>> {
///     Err(ApiError::NotFound("Página não encontrada".to_string()))
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use passabola_shared::{
    backend::BackendError,
    site::{routes::Route, FieldError, SubmitError},
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401) - credentials refused by the provider
    Unauthorized(String),

    /// Unauthorized (401) - the page needs a session; sends the client to login
    SignInRequired(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409) - duplicate rows
    Conflict(String),

    /// Unprocessable entity (422) - validation errors
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),

    /// Service unavailable (503) - backend unreachable
    ServiceUnavailable(String),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

impl From<FieldError> for ValidationErrorDetail {
    fn from(err: FieldError) -> Self {
        Self {
            field: err.field,
            message: err.message,
        }
    }
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,

    /// Page the client should navigate to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::SignInRequired(msg) => write!(f, "Sign-in required: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut redirect = None;

        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::SignInRequired(msg) => {
                redirect = Some(Route::Login.path().to_string());
                (StatusCode::UNAUTHORIZED, "sign_in_required", msg, None)
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                "Verifique os campos destacados".to_string(),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Ocorreu um erro interno".to_string(),
                    None,
                )
            }
            ApiError::ServiceUnavailable(msg) => {
                tracing::warn!("Backend unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "service_unavailable",
                    "Serviço indisponível no momento. Tente novamente.".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
            redirect,
        });

        (status, body).into_response()
    }
}

/// Maps a provider rejection to a status, keeping its message
fn rejection(status: u16, message: String) -> ApiError {
    match status {
        401 | 403 => ApiError::Unauthorized(message),
        404 => ApiError::NotFound(message),
        409 => ApiError::Conflict(message),
        _ => ApiError::BadRequest(message),
    }
}

/// Convert backend errors to API errors
impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Rejected { status, message } => rejection(status, message),
            BackendError::Unauthenticated => ApiError::SignInRequired(err.user_message()),
            BackendError::Transport(msg) => ApiError::ServiceUnavailable(msg),
            BackendError::Decode(msg) => {
                ApiError::InternalError(format!("Unexpected backend response: {}", msg))
            }
            BackendError::Database(msg) => {
                ApiError::InternalError(format!("Database error: {}", msg))
            }
        }
    }
}

/// Convert form submission errors to API errors
impl From<SubmitError> for ApiError {
    fn from(err: SubmitError) -> Self {
        let message = err.to_string();

        match err {
            SubmitError::Invalid(fields) => {
                ApiError::ValidationError(fields.into_iter().map(Into::into).collect())
            }
            SubmitError::InFlight => ApiError::Conflict(message),
            SubmitError::NotSignedIn(_) => ApiError::SignInRequired(message),
            SubmitError::NoIdentity => ApiError::BadRequest(message),
            SubmitError::Remote { error, .. } => match error {
                BackendError::Rejected { status, .. } => rejection(status, message),
                BackendError::Unauthenticated => ApiError::SignInRequired(message),
                other => ApiError::from(other),
            },
        }
    }
}
