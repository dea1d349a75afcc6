use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;
use storage::error::StorageError;
use validator::ValidationErrors;

/// Web layer errors
#[derive(Debug)]
pub enum WebError {
    Storage(StorageError),
    Validation(ValidationErrors),
    BadRequest(String),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "Storage error: {}", e),
            Self::Validation(e) => write!(f, "Validation error: {}", e),
            Self::BadRequest(msg) => write!(f, "Bad request: {}", msg),
        }
    }
}

impl WebError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Storage(StorageError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Self::Storage(StorageError::Validation(_)) => StatusCode::BAD_REQUEST,
            Self::Storage(StorageError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Storage(e) if e.is_unique_violation() => StatusCode::CONFLICT,
            Self::Storage(StorageError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        let body = match &self {
            Self::Storage(
                e @ (StorageError::NotFound { .. }
                | StorageError::Validation(_)
                | StorageError::Conflict(_)),
            ) => {
                json!({
                    "error": e.to_string()
                })
            }
            Self::Storage(
                e @ StorageError::PersistenceMismatch {
                    table,
                    row_id,
                    field,
                    expected,
                    actual,
                },
            ) => {
                tracing::error!("Storage error: {}", e);
                json!({
                    "error": "Write did not persist",
                    "details": {
                        "table": table,
                        "row_id": row_id,
                        "field": field,
                        "expected": expected,
                        "actual": actual,
                    }
                })
            }
            Self::Storage(
                e @ StorageError::PartialBatch {
                    event_id,
                    written,
                    failed,
                },
            ) => {
                tracing::error!("Storage error: {}", e);
                json!({
                    "error": "Rank rewrite partially applied",
                    "details": {
                        "event_id": event_id,
                        "written": written,
                        "failed": failed,
                    }
                })
            }
            Self::Storage(e @ StorageError::Timeout { .. }) => {
                tracing::error!("Storage error: {}", e);
                json!({
                    "error": "The data store did not respond in time"
                })
            }
            Self::Storage(e) if e.is_unique_violation() => {
                json!({
                    "error": "Resource already exists"
                })
            }
            Self::Storage(e) => {
                tracing::error!("Storage error: {:?}", e);
                json!({
                    "error": "An internal error occurred"
                })
            }
            Self::Validation(errors) => {
                let field_errors: Vec<String> = errors
                    .field_errors()
                    .iter()
                    .flat_map(|(field, errors)| {
                        errors.iter().map(move |e| {
                            format!(
                                "{}: {}",
                                field,
                                e.message
                                    .as_ref()
                                    .map(|m| m.to_string())
                                    .unwrap_or_else(|| e.code.to_string())
                            )
                        })
                    })
                    .collect();

                json!({
                    "error": "Validation failed",
                    "details": field_errors
                })
            }
            Self::BadRequest(msg) => {
                json!({
                    "error": msg
                })
            }
        };

        (status_code, Json(body)).into_response()
    }
}

impl From<StorageError> for WebError {
    fn from(error: StorageError) -> Self {
        Self::Storage(error)
    }
}

impl From<ValidationErrors> for WebError {
    fn from(error: ValidationErrors) -> Self {
        Self::Validation(error)
    }
}
