//! Atomic copy of the validated feed into the public directory.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::info;

use crate::FeedError;

/// Copy `document` into `dest_dir` under the same file name.
///
/// The bytes land in a temporary file beside the target and are renamed over
/// it, so readers see either the old feed or the new one.
pub fn publish(document: &Path, dest_dir: &Path) -> Result<PathBuf, FeedError> {
    let file_name = document.file_name().ok_or_else(|| FeedError::Publish {
        path: document.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "document has no file name"),
    })?;
    let target = dest_dir.join(file_name);
    let publish_err = |source| FeedError::Publish {
        path: target.clone(),
        source,
    };

    let bytes = std::fs::read(document).map_err(|source| FeedError::Publish {
        path: document.to_path_buf(),
        source,
    })?;
    let mut tmp = NamedTempFile::new_in(dest_dir).map_err(publish_err)?;
    tmp.write_all(&bytes).map_err(publish_err)?;
    tmp.as_file().sync_all().map_err(publish_err)?;
    tmp.persist(&target).map_err(|e| publish_err(e.error))?;

    info!(path = %target.display(), bytes = bytes.len(), "published feed");
    Ok(target)
}
