// src/progress.rs
use std::time::Duration;

use crate::pipeline::RunReport;
use crate::target::Target;

/// Lightweight progress reporting for long-running fetches.
/// Frontends implement this to surface status to users.
pub trait Progress {
    /// Called once the resume scan is done.
    fn begin(&mut self, _label: &str, _total: usize, _present: usize, _eta: Duration) {}

    /// Free-form status line for human eyes.
    fn log(&mut self, _msg: &str) {}

    /// About to request `target`; `ordinal` counts from 1 across the whole
    /// target list, including what was already on disk.
    fn fetching(&mut self, _ordinal: usize, _total: usize, _target: &Target, _remaining: usize, _eta: Duration) {}

    /// Artifact persisted. `retried` is set when it took a rotation.
    fn item_done(&mut self, _target: &Target, _bytes: u64, _retried: bool) {}

    fn item_failed(&mut self, _target: &Target, _reason: &str) {}

    /// Called at the end, successful or not.
    fn finish(&mut self, _report: &RunReport) {}
}

/// A no-op progress sink.
pub struct NullProgress;
impl Progress for NullProgress {}
