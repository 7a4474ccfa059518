use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use sqlx::any::AnyRow;
use sqlx::{Row, ValueRef};
use uuid::Uuid;

use crate::models::{Attendance, Event};
use crate::utils::error::StoreError;

const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A child table removed together with its parent row.
pub struct Dependent {
    pub table: &'static str,
    pub foreign_key: &'static str,
}

/// Mapping between a model and its table.
///
/// `COLUMNS[0]` is always the primary key and `values()` yields one entry per
/// column in the same order.
pub trait Record: Sized + Send {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];
    const DEPENDENTS: &'static [Dependent] = &[];

    fn id(&self) -> Uuid;
    fn values(&self) -> Vec<Option<String>>;
    fn from_row(row: &AnyRow) -> Result<Self, StoreError>;
}

impl Record for Event {
    const TABLE: &'static str = "event";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "place",
        "start_time",
        "end_time",
        "color",
        "icon",
        "created_at",
    ];
    const DEPENDENTS: &'static [Dependent] = &[Dependent {
        table: Attendance::TABLE,
        foreign_key: "event_id",
    }];

    fn id(&self) -> Uuid {
        self.id
    }

    fn values(&self) -> Vec<Option<String>> {
        vec![
            Some(self.id.to_string()),
            Some(self.name.clone()),
            self.place.clone(),
            Some(format_naive(self.start_time)),
            Some(format_naive(self.end_time)),
            Some(self.color.clone()),
            Some(self.icon.clone()),
            Some(format_utc(self.created_at)),
        ]
    }

    fn from_row(row: &AnyRow) -> Result<Self, StoreError> {
        Ok(Event {
            id: parse_uuid(&get::<String>(row, "id")?)?,
            name: get(row, "name")?,
            place: get_optional(row, "place")?,
            start_time: parse_naive(&get::<String>(row, "start_time")?)?,
            end_time: parse_naive(&get::<String>(row, "end_time")?)?,
            color: get(row, "color")?,
            icon: get(row, "icon")?,
            created_at: parse_utc(&get::<String>(row, "created_at")?)?,
        })
    }
}

impl Record for Attendance {
    const TABLE: &'static str = "attendance";
    const COLUMNS: &'static [&'static str] = &["id", "event_id", "name", "registered_at"];

    fn id(&self) -> Uuid {
        self.id
    }

    fn values(&self) -> Vec<Option<String>> {
        vec![
            Some(self.id.to_string()),
            Some(self.event_id.to_string()),
            Some(self.name.clone()),
            Some(format_utc(self.registered_at)),
        ]
    }

    fn from_row(row: &AnyRow) -> Result<Self, StoreError> {
        Ok(Attendance {
            id: parse_uuid(&get::<String>(row, "id")?)?,
            event_id: parse_uuid(&get::<String>(row, "event_id")?)?,
            name: get(row, "name")?,
            registered_at: parse_utc(&get::<String>(row, "registered_at")?)?,
        })
    }
}

fn get<T>(row: &AnyRow, column: &str) -> Result<T, StoreError>
where
    T: for<'r> sqlx::Decode<'r, sqlx::Any> + sqlx::Type<sqlx::Any>,
{
    row.try_get(column).map_err(StoreError::from)
}

/// The `Any` driver refuses to decode a NULL into `Option<T>` on SQLite, so
/// nullness is checked on the raw value first.
fn get_optional<T>(row: &AnyRow, column: &str) -> Result<Option<T>, StoreError>
where
    T: for<'r> sqlx::Decode<'r, sqlx::Any> + sqlx::Type<sqlx::Any>,
{
    if row.try_get_raw(column)?.is_null() {
        return Ok(None);
    }
    get(row, column).map(Some)
}

pub(crate) fn format_naive(value: NaiveDateTime) -> String {
    value.format(NAIVE_FORMAT).to_string()
}

pub(crate) fn format_utc(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_naive(value: &str) -> Result<NaiveDateTime, StoreError> {
    NaiveDateTime::parse_from_str(value, NAIVE_FORMAT)
        .map_err(|e| StoreError::Data(format!("bad timestamp {value:?}: {e}")))
}

fn parse_utc(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Data(format!("bad timestamp {value:?}: {e}")))
}

fn parse_uuid(value: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(value).map_err(|e| StoreError::Data(format!("bad id {value:?}: {e}")))
}
