use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use serde::Serialize;
use uuid::Uuid;

use crate::state::AppState;
use crate::utils::error::{AppError, RETRY_AFTER_SECS};
use crate::utils::response::{page, success};
use crate::views;

pub mod api;
pub mod attendances;
pub mod events;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
    database: &'static str,
}

/// Process health plus a store probe. Always 200; the payload says whether
/// the database answered.
pub async fn health_check(State(state): State<AppState>) -> Response {
    let (status, database) = match state.store.probe().await {
        Ok(()) => ("ok", "up"),
        Err(err) => {
            tracing::warn!(error = %err, "Health check: database probe failed");
            ("degraded", "down")
        }
    };
    let payload = HealthPayload {
        status,
        service: env!("CARGO_PKG_NAME"),
        database,
    };

    success(payload, "Health check completed").into_response()
}

pub async fn index() -> Redirect {
    Redirect::to("/events")
}

/// Landing page for form submissions refused by the availability guard.
pub async fn service_unavailable() -> Response {
    let mut response = page(StatusCode::SERVICE_UNAVAILABLE, views::service_unavailable());
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(RETRY_AFTER_SECS));
    response
}

/// Path ids that are not UUIDs cannot name a record, so they are not found.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(format!("{what} {raw:?}")))
}
