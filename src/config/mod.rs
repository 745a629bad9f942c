// src/config/mod.rs
pub mod consts;
pub mod context;
pub mod options;

pub use context::{CalendarContext, Location, SolarCalendar};
pub use options::{RunRequest, TargetRange};
