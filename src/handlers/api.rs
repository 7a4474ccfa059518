use axum::extract::State;
use axum::Json;

use crate::models::EventSummary;
use crate::state::AppState;
use crate::utils::error::ApiError;

/// `GET /api/events`: every event, earliest start first.
pub async fn export_events(
    State(state): State<AppState>,
) -> Result<Json<Vec<EventSummary>>, ApiError> {
    let mut uow = state.store.begin().await?;
    let events = uow.list_events().await?;
    Ok(Json(events.iter().map(EventSummary::from).collect()))
}
