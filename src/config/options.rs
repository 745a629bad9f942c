// src/config/options.rs
use std::path::PathBuf;
use std::time::Duration;

use super::consts::*;
use super::context::CalendarContext;
use crate::target::YearMonth;

/// What to enumerate for one context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TargetRange {
    /// Every month of every year in `start..=end`.
    Years { start: i32, end: i32 },
    /// Inclusive month span.
    Months { start: YearMonth, end: YearMonth },
    /// Explicit `YYYY-MM-DD` day pages, in the given order.
    Dates(Vec<String>),
}

impl Default for TargetRange {
    fn default() -> Self {
        TargetRange::Years { start: DEFAULT_START_YEAR, end: DEFAULT_END_YEAR }
    }
}

impl TargetRange {
    pub fn unit(&self) -> &'static str {
        match self {
            TargetRange::Dates(_) => "day",
            _ => "month",
        }
    }
}

/// Parameters of one pipeline run. Fixed for the run's duration.
#[derive(Clone, Debug, PartialEq)]
pub struct RunRequest {
    pub context: CalendarContext,
    pub range: TargetRange,
    pub out_root: PathBuf,
    pub delay: Duration,
    /// Requests per identity before a proactive rotation.
    pub rotate_every: u32,
    /// Bodies shorter than this are soft blocks; persisted files shorter
    /// than this are treated as truncated on resume.
    pub min_valid_size: usize,
    pub timeout: Duration,
    /// Progress label, e.g. "tamil month".
    pub label: String,
}

impl RunRequest {
    pub fn new(context: CalendarContext, range: TargetRange) -> Self {
        let label = format!("{} {}", context.slug(), range.unit());
        Self {
            context,
            range,
            out_root: PathBuf::from(DEFAULT_OUT_DIR),
            delay: Duration::from_secs_f64(DEFAULT_DELAY_SECS),
            rotate_every: ROTATE_EVERY,
            min_valid_size: MIN_VALID_SIZE,
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            label,
        }
    }

    /// `<out_root>/<context>`
    pub fn artifact_dir(&self) -> PathBuf {
        self.out_root.join(self.context.slug())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::context::{Location, SolarCalendar};

    #[test]
    fn defaults_follow_consts() {
        let req = RunRequest::new(
            CalendarContext::Solar(SolarCalendar::Tamil),
            TargetRange::default(),
        );
        assert_eq!(req.delay, Duration::from_secs(20));
        assert_eq!(req.rotate_every, ROTATE_EVERY);
        assert_eq!(req.min_valid_size, MIN_VALID_SIZE);
        assert_eq!(req.label, "tamil month");
        assert_eq!(req.artifact_dir(), PathBuf::from("data").join("tamil"));
    }

    #[test]
    fn day_requests_are_labelled_as_days() {
        let req = RunRequest::new(
            CalendarContext::Lunisolar { location: Location::Nyc },
            TargetRange::Dates(vec!["2025-01-01".into()]),
        );
        assert_eq!(req.label, "lunisolar_nyc day");
    }
}
