use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use blogport_core::{format_preamble_date, OutputFormat, PostRecord, PostResource};
use blogport_logging::{export_debug, export_info};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::archive::{write_archive, ArchiveError};
use crate::delegate::ExportDelegate;
use crate::fetch::Fetcher;
use crate::persist::{ensure_output_dir, PersistError};
use crate::source::{PostSource, SourceError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConfig {
    pub output_format: OutputFormat,
    /// Base for resolving relative media references.
    pub base_uri: Option<Url>,
    pub content_dir: PathBuf,
    /// Image directory, relative to `content_dir`.
    pub images_dir: PathBuf,
    /// Archive file; no archive is written when absent.
    pub archive_path: Option<PathBuf>,
}

impl ExportConfig {
    pub fn default_with_output(content_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_format: OutputFormat::default(),
            base_uri: None,
            content_dir: content_dir.into(),
            images_dir: PathBuf::from("images"),
            archive_path: None,
        }
    }

    pub fn images_path(&self) -> PathBuf {
        self.content_dir.join(&self.images_dir)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),
    #[error("failed to write {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("export cancelled")]
    Cancelled,
}

/// One source record and the result of processing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostPair {
    pub original: PostRecord,
    pub processed: PostRecord,
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct ExportRun {
    pub config: ExportConfig,
    pub posts: Vec<PostPair>,
    pub archive_path: Option<PathBuf>,
}

pub struct Exporter {
    config: ExportConfig,
    delegate: Arc<dyn ExportDelegate>,
    fetcher: Arc<dyn Fetcher>,
}

impl Exporter {
    pub fn new(
        config: ExportConfig,
        delegate: Arc<dyn ExportDelegate>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            config,
            delegate,
            fetcher,
        }
    }

    pub async fn run(
        &self,
        source: &dyn PostSource,
        cancel: &CancellationToken,
    ) -> Result<ExportRun, ExportError> {
        ensure_output_dir(&self.config.content_dir)?;
        ensure_output_dir(&self.config.images_path())?;

        let mut stream = source.open(cancel.clone()).await?;
        let mut posts = Vec::new();
        while let Some(original) = stream.next().await {
            let original = match original {
                Ok(post) => post,
                Err(SourceError::Cancelled) => return Err(ExportError::Cancelled),
                Err(err) => return Err(err.into()),
            };
            posts.push(self.export_post(original, cancel).await?);
        }

        let archive_path = match &self.config.archive_path {
            Some(path) => {
                let selected: Vec<PostRecord> = posts
                    .iter()
                    .map(|pair| self.delegate.archive_post(&pair.original, &pair.processed))
                    .collect();
                Some(write_archive(path, &selected)?)
            }
            None => None,
        };

        Ok(ExportRun {
            config: self.config.clone(),
            posts,
            archive_path,
        })
    }

    async fn export_post(
        &self,
        original: PostRecord,
        cancel: &CancellationToken,
    ) -> Result<PostPair, ExportError> {
        if cancel.is_cancelled() {
            return Err(ExportError::Cancelled);
        }
        let delegate = self.delegate.as_ref();
        let config = &self.config;

        let processed = delegate.process_post(config, original.clone());
        let extension = delegate.file_extension(config, &processed);
        let path = delegate.output_path(config, &processed, &extension);
        self.write_post_file(&processed, &path)?;

        export_info!(
            "Post {} ({}) -> {}",
            processed.title(),
            processed
                .published()
                .map(|date| format_preamble_date(&date))
                .unwrap_or_default(),
            path.display()
        );

        let mut resources: Vec<PostResource> = Vec::with_capacity(processed.resources().len());
        for resource in processed.resources() {
            if cancel.is_cancelled() {
                return Err(ExportError::Cancelled);
            }
            let fetched = delegate
                .download_resource(config, self.fetcher.as_ref(), resource, cancel)
                .await;
            export_debug!(
                "  {} -> {}",
                fetched.original_url(),
                fetched.download_status()
            );
            resources.push(fetched);
        }
        if cancel.is_cancelled() {
            return Err(ExportError::Cancelled);
        }

        let original = original.with_resources(resources.clone());
        let processed = processed.with_resources(resources);
        Ok(PostPair {
            original,
            processed,
        })
    }

    fn write_post_file(&self, post: &PostRecord, path: &Path) -> Result<(), ExportError> {
        let io_error = |source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        };
        let mut writer = self.delegate.open_output(path).map_err(io_error)?;
        self.delegate
            .write_post(&self.config, post, writer.as_mut())
            .map_err(io_error)
    }
}
