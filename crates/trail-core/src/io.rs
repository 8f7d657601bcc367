use crate::error::Result;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

fn staged(path: &Path, data: &[u8]) -> Result<NamedTempFile> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    Ok(tmp)
}

/// Atomically write `data` to `path` using a tempfile in the same directory.
///
/// The tempfile is flushed to disk before the rename, so a process started
/// after this returns observes the complete file.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let tmp = staged(path, data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Like [`atomic_write`] but never replaces an existing file.
///
/// Tries each of `candidates` in order and persists to the first one that
/// does not exist yet. All candidates must share a parent directory. Returns
/// the index of the path written, or `None` (writing nothing) when every
/// candidate is taken.
pub fn atomic_write_first_free(candidates: &[PathBuf], data: &[u8]) -> Result<Option<usize>> {
    let Some(first) = candidates.first() else {
        return Ok(None);
    };
    let mut tmp = staged(first, data)?;
    for (i, path) in candidates.iter().enumerate() {
        match tmp.persist_noclobber(path) {
            Ok(_) => return Ok(Some(i)),
            Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => tmp = e.file,
            Err(e) => return Err(e.error.into()),
        }
    }
    Ok(None)
}

/// Create a directory and all parents, idempotent.
pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)?;
    Ok(())
}

/// Add `entry` to `root/.gitignore` if it isn't already present.
///
/// Checks for an exact line match. Appends with a leading newline separator
/// if the file doesn't already end with one.
pub fn ensure_gitignore_entry(root: &Path, entry: &str) -> Result<()> {
    let gitignore = root.join(".gitignore");
    let existing = if gitignore.exists() {
        std::fs::read_to_string(&gitignore)?
    } else {
        String::new()
    };
    if existing.lines().any(|l| l == entry) {
        return Ok(());
    }
    let sep = if existing.is_empty() || existing.ends_with('\n') {
        ""
    } else {
        "\n"
    };
    let mut f = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&gitignore)?;
    writeln!(f, "{sep}{entry}")?;
    Ok(())
}
