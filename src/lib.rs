// src/lib.rs

#[cfg(feature = "cli")]
pub mod cli;
pub mod classify;
pub mod config;
pub mod core;
pub mod error;
pub mod identity;
pub mod target;

pub mod file;
pub mod pipeline;
pub mod progress;
pub mod store;

pub use error::{Error, Result};
pub use pipeline::{run, CancelToken, FetchOutcome, RunReport, RunStatus};
