use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::input::EventInput;

pub const DEFAULT_COLOR: &str = "#3B82F6";
pub const DEFAULT_ICON: &str = "calendar";

/// A scheduled occurrence attendees can register against.
///
/// Start and end are naive wall-clock times as entered in the form; only the
/// creation timestamp is zoned.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    pub place: Option<String>,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub color: String,
    pub icon: String,
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn new(input: EventInput) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: input.name,
            place: input.place,
            start_time: input.start_time,
            end_time: input.end_time,
            color: input.color,
            icon: input.icon,
            // Stored with microsecond precision.
            created_at: Utc::now().trunc_subsecs(6),
        }
    }

    /// Replaces every user-editable field. Identity and creation time are kept.
    pub fn overwrite(&mut self, input: EventInput) {
        self.name = input.name;
        self.place = input.place;
        self.start_time = input.start_time;
        self.end_time = input.end_time;
        self.color = input.color;
        self.icon = input.icon;
    }
}

/// Entry of the `/api/events` export.
#[derive(Debug, Clone, Serialize)]
pub struct EventSummary {
    pub id: Uuid,
    pub name: String,
    pub place: Option<String>,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub color: String,
    pub icon: String,
}

impl From<&Event> for EventSummary {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id,
            name: event.name.clone(),
            place: event.place.clone(),
            start: event.start_time,
            end: event.end_time,
            color: event.color.clone(),
            icon: event.icon.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn input(name: &str) -> EventInput {
        let day = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        EventInput {
            name: name.to_string(),
            place: Some("HQ".to_string()),
            start_time: day.and_hms_opt(9, 0, 0).unwrap(),
            end_time: day.and_hms_opt(11, 0, 0).unwrap(),
            color: DEFAULT_COLOR.to_string(),
            icon: DEFAULT_ICON.to_string(),
        }
    }

    #[test]
    fn test_new_event_gets_fresh_identity() {
        let a = Event::new(input("Launch"));
        let b = Event::new(input("Launch"));
        assert_ne!(a.id, b.id);
        assert_eq!(a.created_at.timestamp_subsec_nanos() % 1_000, 0);
    }

    #[test]
    fn test_overwrite_keeps_id_and_creation_time() {
        let mut event = Event::new(input("Launch"));
        let (id, created_at) = (event.id, event.created_at);

        let mut changed = input("Relaunch");
        changed.place = None;
        changed.icon = "rocket".to_string();
        event.overwrite(changed);

        assert_eq!(event.id, id);
        assert_eq!(event.created_at, created_at);
        assert_eq!(event.name, "Relaunch");
        assert_eq!(event.place, None);
        assert_eq!(event.icon, "rocket");
    }

    #[test]
    fn test_summary_serializes_exact_field_set() {
        let event = Event::new(input("Launch"));
        let value = serde_json::to_value(EventSummary::from(&event)).unwrap();
        let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            ["color", "end", "icon", "id", "name", "place", "start"]
        );
        assert_eq!(value["start"], "2025-01-10T09:00:00");
        assert_eq!(value["end"], "2025-01-10T11:00:00");
    }
}
