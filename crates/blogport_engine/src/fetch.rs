use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::{FailureKind, FetchError};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            redirect_limit: 10,
            max_bytes: 64 * 1024 * 1024,
        }
    }
}

/// Materializes a remote resource on local disk.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// Downloads `url` into `dest` and returns the number of bytes written.
    ///
    /// Nothing appears at `dest` unless the whole body was received.
    async fn fetch_to_file(
        &self,
        url: &Url,
        dest: &Path,
        cancel: &CancellationToken,
    ) -> Result<u64, FetchError>;
}

#[derive(Debug, Clone, Default)]
pub struct ReqwestFetcher {
    settings: FetchSettings,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self) -> Result<reqwest::Client, FetchError> {
        reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .timeout(self.settings.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(self.settings.redirect_limit))
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))
    }

    fn too_large(&self, actual: u64) -> FetchError {
        FetchError::new(
            FailureKind::TooLarge {
                max_bytes: self.settings.max_bytes,
                actual,
            },
            "response too large",
        )
    }

    async fn download(&self, url: &Url, dest: &Path) -> Result<u64, FetchError> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchError::new(FailureKind::InvalidUrl, url.scheme()));
        }
        let client = self.build_client()?;

        let response = client
            .get(url.clone())
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.canonical_reason().unwrap_or("unknown status"),
            ));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_bytes {
                return Err(self.too_large(content_len));
            }
        }

        // Stream into a sibling temp file; it is removed on drop unless persisted.
        let dir = dest
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let tmp = NamedTempFile::new_in(dir).map_err(io_error)?;
        let mut file = tokio::fs::File::from_std(tmp.reopen().map_err(io_error)?);

        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            written += chunk.len() as u64;
            if written > self.settings.max_bytes {
                return Err(self.too_large(written));
            }
            file.write_all(&chunk).await.map_err(io_error)?;
        }

        file.flush().await.map_err(io_error)?;
        file.sync_all().await.map_err(io_error)?;
        drop(file);

        tmp.persist(dest).map_err(|err| io_error(err.error))?;
        Ok(written)
    }
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch_to_file(
        &self,
        url: &Url,
        dest: &Path,
        cancel: &CancellationToken,
    ) -> Result<u64, FetchError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::new(FailureKind::Cancelled, "download cancelled")),
            result = self.download(url, dest) => result,
        }
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return FetchError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}

fn io_error(err: std::io::Error) -> FetchError {
    FetchError::new(FailureKind::Io, err.to_string())
}
