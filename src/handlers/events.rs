use axum::extract::{Form, Path};
use axum::http::StatusCode;
use axum::response::Response;
use tracing::info;

use super::parse_id;
use crate::db::UnitOfWork;
use crate::models::{DeleteEventForm, Event, EventForm};
use crate::utils::error::AppError;
use crate::utils::flash::{Banner, Flash, Notice};
use crate::views::{self, FormTarget};

pub async fn list_events(flash: Flash, mut uow: UnitOfWork) -> Result<Response, AppError> {
    let events = uow.list_events().await?;
    let html = views::event_list(&events, flash.banner().as_ref());
    Ok(flash.respond(StatusCode::OK, html))
}

pub async fn create_event_form(flash: Flash) -> Response {
    let html = views::event_form(
        FormTarget::Create,
        &EventForm::default(),
        flash.banner().as_ref(),
    );
    flash.respond(StatusCode::OK, html)
}

pub async fn create_event(
    flash: Flash,
    mut uow: UnitOfWork,
    Form(form): Form<EventForm>,
) -> Result<Response, AppError> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(err) => {
            let banner = Banner::error(format!("Could not create event: {err}"));
            let status = StatusCode::UNPROCESSABLE_ENTITY;
            return Ok(form_page(flash, FormTarget::Create, &form, status, banner));
        }
    };

    let event = Event::new(input);
    let saved = match uow.create(&event).await {
        Ok(()) => uow.commit().await,
        Err(err) => Err(err),
    };

    match saved {
        Ok(()) => {
            info!(event_id = %event.id, name = %event.name, "Event created");
            Ok(flash.redirect("/events", Notice::EventCreated))
        }
        Err(err) => {
            err.log();
            let banner = Banner::error("Could not create the event. Please try again.");
            Ok(form_page(flash, FormTarget::Create, &form, err.status_code(), banner))
        }
    }
}

pub async fn edit_event_form(
    flash: Flash,
    Path(raw_id): Path<String>,
    mut uow: UnitOfWork,
) -> Result<Response, AppError> {
    let id = parse_id(&raw_id, "event")?;
    let event: Event = uow.find(id).await?;
    let html = views::event_form(
        FormTarget::Edit(id),
        &EventForm::from(&event),
        flash.banner().as_ref(),
    );
    Ok(flash.respond(StatusCode::OK, html))
}

pub async fn edit_event(
    flash: Flash,
    Path(raw_id): Path<String>,
    mut uow: UnitOfWork,
    Form(form): Form<EventForm>,
) -> Result<Response, AppError> {
    let id = parse_id(&raw_id, "event")?;
    let mut event: Event = uow.find(id).await?;

    let input = match form.validate() {
        Ok(input) => input,
        Err(err) => {
            let banner = Banner::error(format!("Could not update event: {err}"));
            let status = StatusCode::UNPROCESSABLE_ENTITY;
            return Ok(form_page(flash, FormTarget::Edit(id), &form, status, banner));
        }
    };

    event.overwrite(input);
    let saved = match uow.update(&event).await {
        Ok(()) => uow.commit().await,
        Err(err) => Err(err),
    };

    match saved {
        Ok(()) => {
            info!(event_id = %id, "Event updated");
            Ok(flash.redirect(&format!("/events/{id}"), Notice::EventUpdated))
        }
        Err(err) => {
            err.log();
            let banner = Banner::error("Could not update the event. Please try again.");
            Ok(form_page(flash, FormTarget::Edit(id), &form, err.status_code(), banner))
        }
    }
}

pub async fn event_detail(
    flash: Flash,
    Path(raw_id): Path<String>,
    mut uow: UnitOfWork,
) -> Result<Response, AppError> {
    let id = parse_id(&raw_id, "event")?;
    let event: Event = uow.find(id).await?;
    let attendance_count = uow.count_attendances(id).await?;
    let html = views::event_detail(&event, attendance_count, false, flash.banner().as_ref());
    Ok(flash.respond(StatusCode::OK, html))
}

/// Deletes an event and its attendances.
///
/// An event that still has attendances is only deleted when the form carries
/// `confirm_delete`; otherwise the detail page comes back with the prompt and
/// nothing is touched.
pub async fn delete_event(
    flash: Flash,
    Path(raw_id): Path<String>,
    mut uow: UnitOfWork,
    Form(form): Form<DeleteEventForm>,
) -> Result<Response, AppError> {
    let id = parse_id(&raw_id, "event")?;
    let event: Event = uow.find(id).await?;
    let attendance_count = uow.count_attendances(id).await?;

    if attendance_count > 0 && !form.confirmed() {
        info!(event_id = %id, attendance_count, "Event deletion awaiting confirmation");
        let banner =
            Banner::warning("This event has registered attendances. Confirm the deletion.");
        let html = views::event_detail(&event, attendance_count, true, Some(&banner));
        return Ok(flash.respond(StatusCode::OK, html));
    }

    let saved = match uow.delete(&event).await {
        Ok(()) => uow.commit().await,
        Err(err) => Err(err),
    };

    Ok(match saved {
        Ok(()) => {
            info!(event_id = %id, attendance_count, "Event deleted");
            flash.redirect("/events", Notice::EventDeleted)
        }
        Err(err) => {
            err.log();
            flash.redirect(&format!("/events/{id}"), Notice::EventDeleteFailed)
        }
    })
}

fn form_page(
    flash: Flash,
    target: FormTarget,
    form: &EventForm,
    status: StatusCode,
    banner: Banner,
) -> Response {
    let html = views::event_form(target, form, Some(&banner));
    flash.respond(status, html)
}
