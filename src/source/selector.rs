//! Newest-input selection
//!
//! Candidates are ordered by `(modified, path)`. Among files sharing the
//! greatest modification time the lexically greatest path wins, so repeated
//! calls over an unchanged directory always agree.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Returns the most recently modified file in `directory` with the given extension
///
/// # Arguments
///
/// * `directory` - Directory to scan (not recursive)
/// * `extension` - Extension filter without the leading dot, matched exactly
///
/// # Returns
///
/// * `Some(PathBuf)` - The newest matching file
/// * `None` - The directory is missing, unreadable, or holds no matching file
pub fn select_latest(directory: &Path, extension: &str) -> Option<PathBuf> {
    let entries = match std::fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!("Cannot read {}: {}", directory.display(), e);
            return None;
        }
    };

    let mut candidates: Vec<(SystemTime, PathBuf)> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_extension(path, extension))
        .filter_map(|path| {
            let modified = std::fs::metadata(&path).and_then(|m| m.modified());
            match modified {
                Ok(time) => Some((time, path)),
                Err(e) => {
                    tracing::debug!("Skipping {}: {}", path.display(), e);
                    None
                }
            }
        })
        .collect();

    candidates.sort();
    candidates.pop().map(|(_, path)| path)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == extension)
}
