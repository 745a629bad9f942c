// src/file.rs

use std::{
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

use crate::config::consts::PARTIAL_EXT;
use crate::error::{Error, Result};

/// Write `content` to `path`, creating parent directories as needed.
/// Returns bytes written.
///
/// The bytes go to a sibling `<name>.part` first and are renamed into place,
/// so nothing ever exists at `path` unless all of it was written.
pub fn persist(path: &Path, content: &[u8]) -> Result<u64> {
    let io_err = |source: io::Error| Error::Io { path: path.to_path_buf(), source };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_directory(parent).map_err(io_err)?;
        }
    }

    let tmp = partial_path(path);
    let written = write_synced(&tmp, content).and_then(|()| fs::rename(&tmp, path));
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(io_err(e));
    }
    Ok(content.len() as u64)
}

fn write_synced(path: &Path, content: &[u8]) -> io::Result<()> {
    let mut f = File::create(path)?; // truncate/overwrite
    f.write_all(content)?;
    f.sync_all()
}

pub fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".");
    name.push(PARTIAL_EXT);
    path.with_file_name(name)
}

pub fn ensure_directory(dir: &Path) -> io::Result<()> {
    if dir.exists() && !dir.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("path exists but is not a directory: {}", dir.display()),
        ));
    }
    if !dir.exists() { fs::create_dir_all(dir)?; }
    Ok(())
}
