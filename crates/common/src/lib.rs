//! Identity and versioning types shared by every timetable crate.

mod types;

pub use types::{AccountName, AppointmentId, Version};
