use axum::{http::StatusCode, response::IntoResponse, Json};
use diesel::result::DatabaseErrorKind;

/// Failures from the pooled diesel layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Query error: {0}")]
    Query(#[from] diesel::result::Error),
    #[error("Task error: {0}")]
    Task(String),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Query(diesel::result::Error::NotFound))
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            Self::Query(diesel::result::Error::DatabaseError(
                DatabaseErrorKind::UniqueViolation,
                _
            ))
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Upstream error: {0}")]
    Upstream(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        if err.is_not_found() {
            Self::NotFound("record does not exist".to_string())
        } else if err.is_unique_violation() {
            Self::Conflict("record already exists".to_string())
        } else {
            Self::Database(err.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("Request failed: {self}");
        }
        let message = match &self {
            Self::NotFound(msg)
            | Self::Validation(msg)
            | Self::Unauthorized(msg)
            | Self::Conflict(msg)
            | Self::Upstream(msg)
            | Self::Database(msg)
            | Self::Internal(msg) => msg.clone(),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
