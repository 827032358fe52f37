//! Post sources: lazy, cancelable sequences of post records.
use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use blogport_core::{PostId, PostRecord};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

mod archive;
mod mysql;

pub use archive::ArchivePostSource;
pub use mysql::{MysqlPostSource, SUPPORTED_DB_VERSIONS};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot connect to database: {0}")]
    Connection(#[source] sqlx::Error),
    #[error("unsupported database version {encountered:?}; supported versions: {supported:?}")]
    SchemaVersion {
        encountered: Option<i64>,
        supported: Vec<i64>,
    },
    #[error("invalid table prefix {0:?}")]
    InvalidTablePrefix(String),
    #[error("query failed: {0}")]
    Query(#[source] sqlx::Error),
    #[error("post {post_id} has an invalid date {value:?}")]
    InvalidDate { post_id: PostId, value: String },
    #[error("failed to read archive {path}: {source}")]
    ArchiveRead { path: PathBuf, source: io::Error },
    #[error("failed to parse archive {path}: {source}")]
    ArchiveParse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("export cancelled")]
    Cancelled,
}

/// Produces the posts of one export run.
#[async_trait]
pub trait PostSource: Send + Sync {
    /// Starts a single forward pass over the source. Opening again starts over.
    async fn open(&self, cancel: CancellationToken) -> Result<PostStream, SourceError>;
}

enum StreamInner {
    Buffered(std::vec::IntoIter<PostRecord>),
    Channel(mpsc::Receiver<Result<PostRecord, SourceError>>),
}

/// Pull side of an opened source. Cancellation is checked on every pull.
pub struct PostStream {
    inner: StreamInner,
    cancel: CancellationToken,
}

impl PostStream {
    pub fn from_records(records: Vec<PostRecord>, cancel: CancellationToken) -> Self {
        Self {
            inner: StreamInner::Buffered(records.into_iter()),
            cancel,
        }
    }

    pub fn from_channel(
        receiver: mpsc::Receiver<Result<PostRecord, SourceError>>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            inner: StreamInner::Channel(receiver),
            cancel,
        }
    }

    /// Next record, `None` once the source is exhausted.
    pub async fn next(&mut self) -> Option<Result<PostRecord, SourceError>> {
        if self.cancel.is_cancelled() {
            return Some(Err(SourceError::Cancelled));
        }
        match &mut self.inner {
            StreamInner::Buffered(records) => {
                tokio::task::yield_now().await;
                if self.cancel.is_cancelled() {
                    return Some(Err(SourceError::Cancelled));
                }
                records.next().map(Ok)
            }
            StreamInner::Channel(receiver) => {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => Some(Err(SourceError::Cancelled)),
                    item = receiver.recv() => item,
                }
            }
        }
    }

    /// Drains the stream, stopping at the first error.
    pub async fn collect(mut self) -> Result<Vec<PostRecord>, SourceError> {
        let mut records = Vec::new();
        while let Some(record) = self.next().await {
            records.push(record?);
        }
        Ok(records)
    }
}
