//! Filesystem utilities.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::{glob, Pattern};

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> io::Result<()> {
    if !path.is_dir() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Read a file to string, with nice error messages.
pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read file: {}", path.display()))
}

/// Copy `src` to `dst` through a temporary file in the destination directory.
///
/// The temporary file is renamed over `dst` once fully written, so readers
/// see either the previous contents or the new ones. Permissions of `src`
/// are carried over. Returns the number of bytes copied.
pub fn atomic_copy(src: &Path, dst: &Path) -> io::Result<u64> {
    let dir = match dst.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut input = File::open(src)?;
    let mut staged = tempfile::Builder::new()
        .prefix(".extforge-")
        .suffix(".part")
        .tempfile_in(dir)?;

    let bytes = io::copy(&mut input, staged.as_file_mut())?;
    staged.as_file().sync_all()?;
    fs::set_permissions(staged.path(), input.metadata()?.permissions())?;

    staged.persist(dst).map_err(|e| e.error)?;
    Ok(bytes)
}

/// Find files in `base` matching any of the glob `patterns`.
///
/// Patterns are relative to `base`; `base` itself is matched literally.
pub fn glob_files(base: &Path, patterns: &[String]) -> io::Result<Vec<PathBuf>> {
    let escaped_base = Pattern::escape(&base.to_string_lossy());
    let mut results = Vec::new();

    for pattern in patterns {
        let full_pattern = Path::new(&escaped_base).join(pattern);
        let entries = glob(&full_pattern.to_string_lossy()).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid glob pattern `{}`: {}", pattern, e),
            )
        })?;

        for entry in entries {
            match entry {
                Ok(path) => {
                    if path.is_file() {
                        results.push(path);
                    }
                }
                Err(e) => {
                    tracing::warn!("glob error: {}", e);
                }
            }
        }
    }

    results.sort();
    results.dedup();
    Ok(results)
}

/// Delete files in `base` matching `patterns`, except those listed in `keep`.
///
/// Returns the removed paths. A file that vanished in the meantime is not an
/// error.
pub fn remove_matching(base: &Path, patterns: &[String], keep: &[PathBuf]) -> io::Result<Vec<PathBuf>> {
    let mut removed = Vec::new();

    for path in glob_files(base, patterns)? {
        if keep.iter().any(|k| k == &path) {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!("removed stale {}", path.display());
                removed.push(path);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }

    Ok(removed)
}
