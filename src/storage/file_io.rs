//! Private file I/O for the vault's data files
//!
//! `users.json` holds password hashes and wrapped data keys, and the audit
//! log names login identifiers, so every file written here is created
//! readable by its owner only (mode 0600 on Unix). JSON files are replaced
//! atomically: a private temp file beside the target is synced and renamed
//! over it, so a crash never leaves half a user table behind.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{ExpenseError, ExpenseResult};

#[cfg(unix)]
const PRIVATE_MODE: u32 = 0o600;

fn storage_error(action: &str, path: &Path, err: impl std::fmt::Display) -> ExpenseError {
    ExpenseError::Storage(format!("Failed to {} {}: {}", action, path.display(), err))
}

/// Open options whose newly created files are owner-only
fn private_options() -> OpenOptions {
    let mut options = OpenOptions::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(PRIVATE_MODE);
    }
    options
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Load a JSON file, or `T::default()` if it does not exist yet
///
/// A file that exists but does not parse is a `Storage` error naming it;
/// it is never treated as empty.
pub fn read_json<T, P>(path: P) -> ExpenseResult<T>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => return Err(storage_error("read", path, e)),
    };

    serde_json::from_str(&text).map_err(|e| storage_error("parse", path, e))
}

/// Replace a JSON file atomically with owner-only permissions
pub fn write_json_atomic<T, P>(path: P, data: &T) -> ExpenseResult<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| storage_error("create directory", parent, e))?;
    }

    let bytes = serde_json::to_vec_pretty(data).map_err(|e| storage_error("serialize", path, e))?;

    // A stale temp file may carry looser permissions; start from nothing
    let temp_path = temp_path_for(path);
    match fs::remove_file(&temp_path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(storage_error("remove", &temp_path, e)),
    }

    let written = write_private(&temp_path, &bytes)
        .and_then(|()| fs::rename(&temp_path, path));
    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(storage_error("write", path, e));
    }

    Ok(())
}

fn write_private(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file: File = private_options().write(true).create_new(true).open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// Append one line to a private append-only file, creating it if needed
pub fn append_line<P: AsRef<Path>>(path: P, line: &str) -> ExpenseResult<()> {
    let path = path.as_ref();
    let mut file = private_options()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| storage_error("open", path, e))?;

    // Whole line in a single write
    let mut buffer = String::with_capacity(line.len() + 1);
    buffer.push_str(line);
    buffer.push('\n');
    file.write_all(buffer.as_bytes())
        .and_then(|()| file.flush())
        .map_err(|e| storage_error("append to", path, e))
}
