//! Pre-flight store check for mutating requests.
//!
//! The database is a managed instance that may be asleep. Rather than letting
//! a write fail halfway through a handler, every non-safe request first runs
//! the liveness probe and is turned away with a degraded-service response if
//! the store does not answer. Safe methods skip the probe; if the store fails
//! under them, [`AppError`](crate::utils::error::AppError) classifies the
//! error instead.

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use tracing::warn;

use crate::state::AppState;
use crate::utils::error::RETRY_AFTER_SECS;
use crate::utils::response::error as error_response;

/// Informational page non-API clients are redirected to.
pub const UNAVAILABLE_PATH: &str = "/unavailable";

pub async fn availability_guard(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if !is_mutating(request.method()) {
        return next.run(request).await;
    }

    match state.store.probe().await {
        Ok(()) => next.run(request).await,
        Err(err) => {
            warn!(
                method = %request.method(),
                path = %request.uri().path(),
                error = %err,
                "Store probe failed, refusing request"
            );
            if wants_json(request.uri().path(), request.headers()) {
                error_response(
                    "database_unavailable",
                    "The database is temporarily unavailable, please retry shortly",
                    Some(RETRY_AFTER_SECS),
                    StatusCode::SERVICE_UNAVAILABLE,
                )
            } else {
                Redirect::to(UNAVAILABLE_PATH).into_response()
            }
        }
    }
}

fn is_mutating(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

fn wants_json(path: &str, headers: &HeaderMap) -> bool {
    let names_json = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("application/json"))
    };
    path.starts_with("/api/") || names_json(header::ACCEPT) || names_json(header::CONTENT_TYPE)
}
