pub mod availability;

pub use availability::{availability_guard, UNAVAILABLE_PATH};
