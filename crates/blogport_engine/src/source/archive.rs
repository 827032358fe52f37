use std::path::PathBuf;

use async_trait::async_trait;
use blogport_core::PostRecord;
use blogport_logging::{export_debug, export_info};
use tokio_util::sync::CancellationToken;

use super::{PostSource, PostStream, SourceError};

/// Reads posts back from an archive written by a previous export.
#[derive(Debug, Clone)]
pub struct ArchivePostSource {
    path: PathBuf,
}

impl ArchivePostSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PostSource for ArchivePostSource {
    async fn open(&self, cancel: CancellationToken) -> Result<PostStream, SourceError> {
        let json = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| SourceError::ArchiveRead {
                path: self.path.clone(),
                source,
            })?;
        let records: Vec<PostRecord> =
            serde_json::from_str(&json).map_err(|source| SourceError::ArchiveParse {
                path: self.path.clone(),
                source,
            })?;

        let total = records.len();
        let records: Vec<PostRecord> = records
            .into_iter()
            .filter(|record| {
                let dated = record.published().is_some();
                if !dated {
                    export_debug!("Skipping post {} without a published date", record.id());
                }
                dated
            })
            .collect();
        export_info!(
            "Read {} of {total} posts from {}",
            records.len(),
            self.path.display()
        );

        Ok(PostStream::from_records(records, cancel))
    }
}
