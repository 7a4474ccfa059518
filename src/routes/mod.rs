use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, create_security_headers_layer, Config};
use crate::handlers::{api, attendances, events, health_check, index, service_unavailable};
use crate::middleware::{availability_guard, UNAVAILABLE_PATH};
use crate::state::AppState;

pub fn create_routes(state: AppState, config: &Config) -> Router {
    let api = Router::new()
        .route("/events", get(api::export_events))
        .layer(create_cors_layer(config));

    Router::new()
        .route("/", get(index))
        .route("/events", get(events::list_events))
        .route(
            "/events/create",
            get(events::create_event_form).post(events::create_event),
        )
        .route("/events/:id", get(events::event_detail))
        .route(
            "/events/:id/edit",
            get(events::edit_event_form).post(events::edit_event),
        )
        .route("/events/:id/delete", post(events::delete_event))
        .route("/events/:id/attendances", get(attendances::list_attendances))
        .route(
            "/events/:id/attendances/register",
            post(attendances::register_attendance),
        )
        .route("/attendances/:id/delete", post(attendances::delete_attendance))
        .route(UNAVAILABLE_PATH, get(service_unavailable))
        .route("/health", get(health_check))
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            availability_guard,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(create_security_headers_layer(config))
        .with_state(state)
}
