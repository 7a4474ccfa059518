use axum::extract::{Form, Path};
use axum::http::StatusCode;
use axum::response::Response;
use tracing::{debug, info};

use super::parse_id;
use crate::db::UnitOfWork;
use crate::models::{Attendance, AttendanceForm, Event};
use crate::utils::error::AppError;
use crate::utils::flash::{Flash, Notice};
use crate::views;

fn attendance_path(event_id: impl std::fmt::Display) -> String {
    format!("/events/{event_id}/attendances")
}

pub async fn list_attendances(
    flash: Flash,
    Path(raw_id): Path<String>,
    mut uow: UnitOfWork,
) -> Result<Response, AppError> {
    let event_id = parse_id(&raw_id, "event")?;
    let event: Event = uow.find(event_id).await?;
    let attendances = uow.list_attendances(event_id).await?;
    let html = views::attendance_list(&event, &attendances, flash.banner().as_ref());
    Ok(flash.respond(StatusCode::OK, html))
}

/// The event is looked up first, so an unknown id is a 404 and nothing is
/// written.
pub async fn register_attendance(
    flash: Flash,
    Path(raw_id): Path<String>,
    mut uow: UnitOfWork,
    Form(form): Form<AttendanceForm>,
) -> Result<Response, AppError> {
    let event_id = parse_id(&raw_id, "event")?;
    let event: Event = uow.find(event_id).await?;
    let back = attendance_path(event.id);

    let input = match form.validate() {
        Ok(input) => input,
        Err(err) => {
            debug!(event_id = %event.id, error = %err, "Attendance rejected");
            return Ok(flash.redirect(&back, Notice::AttendanceRejected));
        }
    };

    let attendance = Attendance::new(event.id, input);
    let saved = match uow.create(&attendance).await {
        Ok(()) => uow.commit().await,
        Err(err) => Err(err),
    };

    Ok(match saved {
        Ok(()) => {
            info!(attendance_id = %attendance.id, event_id = %event.id, "Attendance registered");
            flash.redirect(&back, Notice::AttendanceRegistered)
        }
        Err(err) => {
            err.log();
            flash.redirect(&back, Notice::AttendanceRegisterFailed)
        }
    })
}

pub async fn delete_attendance(
    flash: Flash,
    Path(raw_id): Path<String>,
    mut uow: UnitOfWork,
) -> Result<Response, AppError> {
    let id = parse_id(&raw_id, "attendance")?;
    let attendance: Attendance = uow.find(id).await?;
    let back = attendance_path(attendance.event_id);

    let saved = match uow.delete(&attendance).await {
        Ok(()) => uow.commit().await,
        Err(err) => Err(err),
    };

    Ok(match saved {
        Ok(()) => {
            info!(attendance_id = %id, event_id = %attendance.event_id, "Attendance deleted");
            flash.redirect(&back, Notice::AttendanceDeleted)
        }
        Err(err) => {
            err.log();
            flash.redirect(&back, Notice::AttendanceDeleteFailed)
        }
    })
}
