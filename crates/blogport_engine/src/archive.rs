use std::path::{Path, PathBuf};

use blogport_core::PostRecord;
use blogport_logging::export_info;
use thiserror::Error;

use crate::persist::{AtomicFileWriter, PersistError};

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("failed to serialize archive: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write archive: {0}")]
    Persist(#[from] PersistError),
}

/// Writes the posts as an indented JSON array to `path`.
///
/// Parent directories are created and the file is replaced atomically.
pub fn write_archive(path: &Path, posts: &[PostRecord]) -> Result<PathBuf, ArchiveError> {
    let json = serde_json::to_string_pretty(posts)?;
    let written = AtomicFileWriter::new(path.to_path_buf()).write(json.as_bytes())?;
    export_info!("Archive with {} posts -> {}", posts.len(), written.display());
    Ok(written)
}
