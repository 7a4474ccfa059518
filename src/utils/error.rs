use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

use crate::utils::response::{error as error_response, page};
use crate::views;

/// Seconds a client is asked to wait when the database is unreachable.
pub const RETRY_AFTER_SECS: u64 = 30;

/// Lowercased fragments that mark a storage error as a reachability problem.
const CONNECTIVITY_KEYWORDS: &[&str] = &[
    "connection",
    "timeout",
    "timed out",
    "could not connect to server",
    "not yet accepting connections",
    "network",
    "refused",
    "closed pool",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{0} must be at most {1} characters")]
    TooLong(&'static str, usize),

    #[error("{0} must be a date and time like 2025-01-10T09:00")]
    InvalidDateTime(&'static str),

    #[error("color must be a hex value like #3B82F6")]
    InvalidColor,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{table} {id} not found")]
    NotFound { table: &'static str, id: Uuid },

    #[error("database unreachable: {0}")]
    Connectivity(String),

    #[error("database failure: {0}")]
    Data(String),
}

impl StoreError {
    pub fn is_connectivity(&self) -> bool {
        matches!(self, StoreError::Connectivity(_))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            StoreError::Connectivity(_) => StatusCode::SERVICE_UNAVAILABLE,
            StoreError::Data(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Writes the raw cause to the operator log. Never shown to users.
    pub fn log(&self) {
        match self {
            StoreError::NotFound { table, id } => {
                tracing::debug!(table, %id, "Record not found");
            }
            StoreError::Connectivity(detail) => {
                warn!(detail = %detail, "Database unavailable");
            }
            StoreError::Data(detail) => {
                error!(detail = %detail, "Database error");
            }
        }
    }

    pub(crate) fn classify(message: String) -> Self {
        if is_connectivity_message(&message) {
            StoreError::Connectivity(message)
        } else {
            StoreError::Data(message)
        }
    }
}

pub fn is_connectivity_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    CONNECTIVITY_KEYWORDS.iter().any(|k| lower.contains(k))
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => StoreError::Connectivity(err.to_string()),
            _ => StoreError::classify(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        match err {
            sqlx::migrate::MigrateError::Execute(inner) => inner.into(),
            other => StoreError::classify(other.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => AppError::NotFound(err.to_string()),
            other => AppError::Store(other),
        }
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Store(e) => e.status_code(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::Store(StoreError::Connectivity(_)) => "database_unavailable",
            AppError::Store(_) => "database_error",
        }
    }

    fn public_message(&self) -> String {
        match self {
            AppError::NotFound(_) => "The requested resource does not exist".to_string(),
            AppError::Store(StoreError::Connectivity(_)) => {
                "The database is temporarily unavailable, please try again shortly".to_string()
            }
            AppError::Store(_) => "An unexpected database error occurred".to_string(),
        }
    }

    fn log(&self) {
        match self {
            AppError::NotFound(msg) => tracing::debug!(message = %msg, "Not found"),
            AppError::Store(e) => e.log(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();

        match &self {
            AppError::NotFound(_) => page(StatusCode::NOT_FOUND, views::not_found()),
            AppError::Store(StoreError::Connectivity(_)) => {
                let mut response =
                    page(StatusCode::SERVICE_UNAVAILABLE, views::database_unavailable());
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(RETRY_AFTER_SECS));
                response
            }
            AppError::Store(_) => {
                page(StatusCode::INTERNAL_SERVER_ERROR, views::database_error())
            }
        }
    }
}

/// JSON rendition of [`AppError`] for the `/api` routes.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        err.log();

        let retry_after = matches!(err, AppError::Store(StoreError::Connectivity(_)))
            .then_some(RETRY_AFTER_SECS);

        // Do not expose internal details in the API response
        error_response(err.code(), err.public_message(), retry_after, err.status_code())
    }
}
