// src/store.rs
//! The artifact directory as resume ledger.
//!
//! There is no run-state file. A target is done when its artifact exists at
//! the derived path and is at least `min_valid_size` bytes long; anything
//! shorter was cut off mid-write by an older tool or a crash and gets
//! fetched again.

use std::{fs, io, path::{Path, PathBuf}};

use crate::target::Target;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArtifactState {
    Present(u64),
    Truncated(u64),
    Missing,
}

pub fn artifact_path(dir: &Path, target: &Target) -> PathBuf {
    dir.join(&target.filename)
}

pub fn inspect(path: &Path, min_valid_size: usize) -> ArtifactState {
    match fs::metadata(path) {
        Ok(m) if m.is_file() && m.len() >= min_valid_size as u64 => ArtifactState::Present(m.len()),
        Ok(m) if m.is_file() => ArtifactState::Truncated(m.len()),
        _ => ArtifactState::Missing,
    }
}

pub fn is_persisted(path: &Path, min_valid_size: usize) -> bool {
    matches!(inspect(path, min_valid_size), ArtifactState::Present(_))
}

/// Split of a target list against what is already on disk.
#[derive(Clone, Debug, Default)]
pub struct Ledger {
    pub total: usize,
    pub present: usize,
    pub truncated: usize,
    /// Missing or truncated targets, in enumeration order.
    pub pending: Vec<Target>,
}

pub fn scan(dir: &Path, targets: Vec<Target>, min_valid_size: usize) -> Ledger {
    let mut ledger = Ledger { total: targets.len(), ..Ledger::default() };
    for t in targets {
        match inspect(&artifact_path(dir, &t), min_valid_size) {
            ArtifactState::Present(_) => ledger.present += 1,
            ArtifactState::Truncated(len) => {
                tracing::warn!(file = %t.filename, len, "truncated artifact, will refetch");
                ledger.truncated += 1;
                ledger.pending.push(t);
            }
            ArtifactState::Missing => ledger.pending.push(t),
        }
    }
    ledger
}

/* ---------------- Consumer side ---------------- */

/// Persisted artifacts for `targets`, in order. Gaps are skipped, so a
/// parser can run over a partially fetched range.
pub fn artifacts<'a>(
    dir: &'a Path,
    targets: &'a [Target],
    min_valid_size: usize,
) -> impl Iterator<Item = (&'a Target, PathBuf)> + 'a {
    targets.iter().filter_map(move |t| {
        let path = artifact_path(dir, t);
        is_persisted(&path, min_valid_size).then_some((t, path))
    })
}

/// Reads one artifact as text. Bytes that are not UTF-8 are an
/// `InvalidData` error rather than being replaced.
pub fn read_artifact(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
