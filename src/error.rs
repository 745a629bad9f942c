// src/error.rs
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::CalendarContext;

/// Errors that terminate a run. Per-target transport failures and soft
/// blocks are outcomes, not errors; see `pipeline::FetchOutcome`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid range: {0}")]
    InvalidRange(String),

    #[error("{0} has no day pages")]
    NoDayPages(CalendarContext),

    #[error("cannot write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
