//! Form schemas for the HTML handlers.
//!
//! Every field is optional at the extraction layer so that a missing or
//! malformed value becomes a [`ValidationError`] the handler can show next to
//! the form, instead of an extractor rejection.

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::Deserialize;

use super::event::{Event, DEFAULT_COLOR, DEFAULT_ICON};
use crate::utils::error::ValidationError;

/// Format produced by `<input type="datetime-local">`.
pub const FORM_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M";
const FORM_DATETIME_SECONDS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub const NAME_MAX_LEN: usize = 100;
pub const PLACE_MAX_LEN: usize = 200;
pub const ICON_MAX_LEN: usize = 50;
/// Stored timestamps are fixed-width text, which only sorts with four-digit years.
const MAX_YEAR: i32 = 9999;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventForm {
    pub name: Option<String>,
    pub place: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

/// Validated event fields, ready to be applied to an [`Event`].
#[derive(Debug, Clone, PartialEq)]
pub struct EventInput {
    pub name: String,
    pub place: Option<String>,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub color: String,
    pub icon: String,
}

impl EventForm {
    pub fn validate(&self) -> Result<EventInput, ValidationError> {
        let name = required_text(self.name.as_deref(), "name", NAME_MAX_LEN)?;
        let place = optional_text(self.place.as_deref(), "place", PLACE_MAX_LEN)?;
        let start_time = parse_datetime(self.start.as_deref(), "start")?;
        let end_time = parse_datetime(self.end.as_deref(), "end")?;

        let color = match trimmed(self.color.as_deref()) {
            None => DEFAULT_COLOR.to_string(),
            Some(color) if is_hex_color(color) => color.to_string(),
            Some(_) => return Err(ValidationError::InvalidColor),
        };
        let icon = optional_text(self.icon.as_deref(), "icon", ICON_MAX_LEN)?
            .unwrap_or_else(|| DEFAULT_ICON.to_string());

        Ok(EventInput {
            name,
            place,
            start_time,
            end_time,
            color,
            icon,
        })
    }
}

impl From<&Event> for EventForm {
    fn from(event: &Event) -> Self {
        Self {
            name: Some(event.name.clone()),
            place: event.place.clone(),
            start: Some(form_datetime(event.start_time)),
            end: Some(form_datetime(event.end_time)),
            color: Some(event.color.clone()),
            icon: Some(event.icon.clone()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttendanceForm {
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceInput {
    pub name: String,
}

impl AttendanceForm {
    pub fn validate(&self) -> Result<AttendanceInput, ValidationError> {
        Ok(AttendanceInput {
            name: required_text(self.name.as_deref(), "name", NAME_MAX_LEN)?,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteEventForm {
    pub confirm_delete: Option<String>,
}

impl DeleteEventForm {
    /// Absent means not confirmed; any submitted value, even empty, confirms.
    pub fn confirmed(&self) -> bool {
        self.confirm_delete.is_some()
    }
}

fn trimmed(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn required_text(
    value: Option<&str>,
    field: &'static str,
    max: usize,
) -> Result<String, ValidationError> {
    optional_text(value, field, max)?.ok_or(ValidationError::Missing(field))
}

fn optional_text(
    value: Option<&str>,
    field: &'static str,
    max: usize,
) -> Result<Option<String>, ValidationError> {
    match trimmed(value) {
        None => Ok(None),
        Some(v) if v.chars().count() > max => Err(ValidationError::TooLong(field, max)),
        Some(v) => Ok(Some(v.to_string())),
    }
}

fn parse_datetime(
    value: Option<&str>,
    field: &'static str,
) -> Result<NaiveDateTime, ValidationError> {
    let raw = trimmed(value).ok_or(ValidationError::Missing(field))?;
    NaiveDateTime::parse_from_str(raw, FORM_DATETIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, FORM_DATETIME_SECONDS_FORMAT))
        .ok()
        .filter(|value| (0..=MAX_YEAR).contains(&value.year()))
        .ok_or(ValidationError::InvalidDateTime(field))
}

/// Seconds are only written out when present, so re-saving keeps them.
fn form_datetime(value: NaiveDateTime) -> String {
    if value.second() == 0 {
        value.format(FORM_DATETIME_FORMAT).to_string()
    } else {
        value.format(FORM_DATETIME_SECONDS_FORMAT).to_string()
    }
}

fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}
