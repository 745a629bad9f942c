// src/pipeline.rs
//! The fetch loop.
//!
//! One target at a time, in enumeration order, never concurrently: the
//! server's automation detection reacts to bursts. Per target:
//!
//! ```text
//! Pending → Fetching → Persisted
//!                    → Failed              (transport; picked up by the next run)
//!                    → Blocked → Rotating → Retrying → Persisted | Failed
//!                                                    → Blocked (halts the run)
//! ```
//!
//! Cancellation is cooperative. The token is polled at the top of every
//! iteration and before every pacing sleep (and during it), never while a
//! request or a write is in flight.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crate::{
    classify::{classify, Verdict},
    config::{consts::PACE_SLICE_MS, RunRequest},
    core::net::{Fetcher, TransportError},
    error::Result,
    file,
    identity::Identity,
    progress::{NullProgress, Progress},
    store,
    target::{enumerate, Target},
};

/// Shared "please stop" flag. Clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of one attempt at one target.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Persisted; bytes written.
    Saved(u64),
    /// Server answered with a challenge page of this size. Nothing written.
    SoftBlocked(usize),
    TransportError(TransportError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunStatus {
    /// Everything was on disk already; the server was not contacted.
    UpToDate,
    /// Every pending target was attempted.
    Completed,
    Cancelled,
    /// Still soft-blocked right after a rotation; the run stopped at this artifact.
    Blocked { artifact: String },
    /// Writing this artifact failed. `run` returns the error after reporting.
    Aborted { artifact: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunReport {
    pub label: String,
    pub total: usize,
    pub already_present: usize,
    pub downloaded: usize,
    pub failed: usize,
    pub rotations: usize,
    pub status: RunStatus,
}

impl RunReport {
    /// Targets still without an artifact.
    pub fn remaining(&self) -> usize {
        self.total - self.already_present - self.downloaded
    }
}

struct PipelineState {
    already_present: usize,
    downloaded: usize,
    failed: usize,
    rotations: usize,
    identity: Identity,
}

impl PipelineState {
    fn rotate(&mut self, request: &RunRequest, reason: &str) {
        let old = self.identity.serial();
        self.identity = Identity::new(&request.context);
        self.rotations += 1;
        tracing::info!(old, new = self.identity.serial(), reason, "rotated identity");
    }

    fn report(&self, request: &RunRequest, total: usize, status: RunStatus) -> RunReport {
        RunReport {
            label: request.label.clone(),
            total,
            already_present: self.already_present,
            downloaded: self.downloaded,
            failed: self.failed,
            rotations: self.rotations,
            status,
        }
    }
}

/// `delay × remaining`, saturating instead of overflowing.
fn eta(delay: Duration, remaining: usize) -> Duration {
    delay.saturating_mul(u32::try_from(remaining).unwrap_or(u32::MAX))
}

/// Run `request` to completion, cancellation, or a systemic block.
///
/// Idempotent: targets already persisted are skipped, so re-running the same
/// request after any kind of stop fetches only what is missing. Only
/// enumeration errors and write failures are returned as `Err`; a write
/// failure still reaches `progress.finish` with `RunStatus::Aborted` first.
pub fn run<F: Fetcher + ?Sized>(
    request: &RunRequest,
    fetcher: &mut F,
    cancel: &CancelToken,
    progress: Option<&mut dyn Progress>,
) -> Result<RunReport> {
    let mut null = NullProgress;
    let progress: &mut dyn Progress = match progress {
        Some(p) => p,
        None => &mut null,
    };

    let targets = enumerate(&request.range, &request.context)?;
    let dir = request.artifact_dir();
    let ledger = store::scan(&dir, targets, request.min_valid_size);
    let total = ledger.total;
    // Repeated explicit dates: fetch each file once, credit the copies after
    let mut seen = HashSet::new();
    let (mut work, mut copies) = (Vec::new(), Vec::new());
    for t in &ledger.pending {
        if seen.insert(t.filename.as_str()) {
            work.push(t);
        } else {
            copies.push(t);
        }
    }
    let mut remaining = work.len();

    progress.begin(&request.label, total, ledger.present, eta(request.delay, remaining));
    tracing::debug!(label = %request.label, total, present = ledger.present, truncated = ledger.truncated, "resume scan");

    if remaining == 0 {
        let report = RunReport {
            label: request.label.clone(),
            total,
            already_present: ledger.present,
            downloaded: 0,
            failed: 0,
            rotations: 0,
            status: RunStatus::UpToDate,
        };
        progress.finish(&report);
        return Ok(report);
    }

    let mut state = PipelineState {
        already_present: ledger.present,
        downloaded: 0,
        failed: 0,
        rotations: 0,
        identity: Identity::new(&request.context),
    };
    let mut status = RunStatus::Completed;
    let mut write_error = None;

    for target in work {
        if cancel.is_cancelled() {
            status = RunStatus::Cancelled;
            break;
        }

        if request.rotate_every > 0 && state.identity.uses() >= request.rotate_every {
            state.rotate(request, "interval");
        }

        remaining -= 1;
        let ordinal = state.already_present + state.downloaded + state.failed + 1;
        progress.fetching(ordinal, total, target, remaining, eta(request.delay, remaining));

        let outcome = match attempt(request, fetcher, &mut state.identity, target) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(file = %target.filename, error = %e, "write failed, aborting");
                status = RunStatus::Aborted { artifact: target.filename.clone() };
                write_error = Some(e);
                break;
            }
        };
        match outcome {
            FetchOutcome::Saved(bytes) => {
                state.downloaded += 1;
                progress.item_done(target, bytes, false);
            }
            FetchOutcome::TransportError(e) => {
                state.failed += 1;
                tracing::warn!(file = %target.filename, error = %e, "fetch failed");
                progress.item_failed(target, &e.to_string());
            }
            FetchOutcome::SoftBlocked(size) => {
                tracing::warn!(file = %target.filename, size, uses = state.identity.uses(), "soft block");
                progress.log(&format!(
                    "Soft block ({size} bytes) after {} requests on this identity. Rotating...",
                    state.identity.uses()
                ));
                state.rotate(request, "soft block");

                match attempt(request, fetcher, &mut state.identity, target) {
                    Ok(FetchOutcome::Saved(bytes)) => {
                        state.downloaded += 1;
                        progress.item_done(target, bytes, true);
                    }
                    Ok(FetchOutcome::TransportError(e)) => {
                        state.failed += 1;
                        tracing::warn!(file = %target.filename, error = %e, "retry failed");
                        progress.item_failed(target, &e.to_string());
                    }
                    Ok(FetchOutcome::SoftBlocked(size)) => {
                        tracing::error!(file = %target.filename, size, "still blocked after rotation, halting");
                        status = RunStatus::Blocked { artifact: target.filename.clone() };
                        break;
                    }
                    Err(e) => {
                        tracing::error!(file = %target.filename, error = %e, "write failed, aborting");
                        status = RunStatus::Aborted { artifact: target.filename.clone() };
                        write_error = Some(e);
                        break;
                    }
                }
            }
        }

        if remaining > 0 && !cancel.is_cancelled() {
            pace(request.delay, cancel);
        }
    }

    for copy in copies {
        if store::is_persisted(&store::artifact_path(&dir, copy), request.min_valid_size) {
            state.already_present += 1;
        }
    }

    let report = state.report(request, total, status);
    progress.finish(&report);
    match write_error {
        Some(e) => Err(e),
        None => Ok(report),
    }
}

/// One request for `target` under `identity`; persists on a valid body.
fn attempt<F: Fetcher + ?Sized>(
    request: &RunRequest,
    fetcher: &mut F,
    identity: &mut Identity,
    target: &Target,
) -> Result<FetchOutcome> {
    identity.record_use();
    let fetched = match fetcher.fetch(&target.url, identity, request.timeout) {
        Ok(f) => f,
        Err(e) => return Ok(FetchOutcome::TransportError(e)),
    };
    if !fetched.is_success() {
        return Ok(FetchOutcome::TransportError(TransportError::Status(fetched.status)));
    }

    match classify(&fetched.body, request.min_valid_size) {
        Verdict::SoftBlocked => Ok(FetchOutcome::SoftBlocked(fetched.body.len())),
        Verdict::Valid => {
            let path = store::artifact_path(&request.artifact_dir(), target);
            let bytes = file::persist(&path, &fetched.body)?;
            tracing::debug!(file = %target.filename, bytes, "saved");
            Ok(FetchOutcome::Saved(bytes))
        }
    }
}

/// Blocking sleep between requests. Wakes early once `cancel` is set.
fn pace(delay: Duration, cancel: &CancelToken) {
    let deadline = Instant::now() + delay;
    let slice = Duration::from_millis(PACE_SLICE_MS);
    loop {
        let now = Instant::now();
        if now >= deadline || cancel.is_cancelled() {
            return;
        }
        thread::sleep(slice.min(deadline - now));
    }
}
