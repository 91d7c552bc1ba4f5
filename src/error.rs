use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failures reported by a table store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Network, pool or timeout failure; safe to re-run
    #[error("store unavailable: {0}")]
    Transient(String),

    #[error("permission denied on {0}")]
    Permission(String),

    #[error("table not found: {0}")]
    NotFound(String),

    #[error("row {index} out of range for table {table}")]
    RowOutOfRange { table: String, index: usize },
}

impl StoreError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Transient(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) => match db.code().as_deref() {
                Some("42501") => StoreError::Permission(db.message().to_string()),
                Some("42P01") => StoreError::NotFound(db.message().to_string()),
                _ => StoreError::Transient(err.to_string()),
            },
            sqlx::Error::RowNotFound => StoreError::NotFound(err.to_string()),
            _ => StoreError::Transient(err.to_string()),
        }
    }
}

/// Errors surfaced to API callers
#[derive(Error, Debug)]
pub enum AppError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("a sync is already in progress")]
    Busy,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Busy => StatusCode::CONFLICT,
            AppError::Store(StoreError::Permission(_)) => StatusCode::FORBIDDEN,
            AppError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Store(StoreError::Transient(_)) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Store(StoreError::RowOutOfRange { .. }) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown in the client's notification toast
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::Busy => {
                "A save is already in progress. Nothing was changed, try again in a moment."
                    .to_string()
            }
            AppError::Store(StoreError::Permission(_)) => {
                "The order sheet is not shared with this service. Ask the sheet owner to grant edit access."
                    .to_string()
            }
            AppError::Store(StoreError::Transient(_)) => {
                "Could not reach the order sheet. Your orders are still kept locally, please retry."
                    .to_string()
            }
            other => format!("Error: {}", other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        } else {
            tracing::warn!("request rejected: {}", self);
        }

        let body = json!({
            "success": false,
            "message": self.user_message(),
            "data": null,
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_errors_are_retryable() {
        assert!(StoreError::Transient("timeout".into()).is_retryable());
        assert!(!StoreError::Permission("Orders".into()).is_retryable());
        assert!(!StoreError::NotFound("Orders".into()).is_retryable());
    }

    #[test]
    fn permission_has_distinct_status_and_message() {
        let err = AppError::from(StoreError::Permission("Orders".into()));
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert!(err.user_message().contains("grant edit access"));

        let transient = AppError::from(StoreError::Transient("down".into()));
        assert_eq!(transient.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_ne!(err.user_message(), transient.user_message());
    }

    #[test]
    fn busy_maps_to_conflict() {
        assert_eq!(AppError::Busy.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn pool_timeout_is_transient() {
        let err = StoreError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, StoreError::Transient(_)));
    }
}
