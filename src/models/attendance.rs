use chrono::{DateTime, SubsecRound, Utc};
use uuid::Uuid;

use super::input::AttendanceInput;

/// One named attendee registered to one event.
#[derive(Debug, Clone, PartialEq)]
pub struct Attendance {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub registered_at: DateTime<Utc>,
}

impl Attendance {
    pub fn new(event_id: Uuid, input: AttendanceInput) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id,
            name: input.name,
            registered_at: Utc::now().trunc_subsecs(6),
        }
    }
}
