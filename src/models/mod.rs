pub mod attendance;
pub mod event;
pub mod input;

pub use attendance::Attendance;
pub use event::{Event, EventSummary, DEFAULT_COLOR, DEFAULT_ICON};
pub use input::{AttendanceForm, AttendanceInput, DeleteEventForm, EventForm, EventInput};
