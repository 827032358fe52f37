use std::fmt;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use url::Url;

/// Outcome of mirroring one resource during an export run.
///
/// The status only ever moves forward from `NotAttempted` to one of the
/// terminal states, and a terminal resource is not fetched again in the
/// same run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DownloadStatus {
    #[default]
    NotAttempted,
    AlreadyPresent,
    Succeeded,
    Failed,
}

impl DownloadStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, DownloadStatus::NotAttempted)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DownloadStatus::NotAttempted => "NotAttempted",
            DownloadStatus::AlreadyPresent => "AlreadyPresent",
            DownloadStatus::Succeeded => "Succeeded",
            DownloadStatus::Failed => "Failed",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        [
            DownloadStatus::NotAttempted,
            DownloadStatus::AlreadyPresent,
            DownloadStatus::Succeeded,
            DownloadStatus::Failed,
        ]
        .into_iter()
        .find(|status| status.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `AlreadyPresent` only matters inside a run; archives record it as `Succeeded`.
impl Serialize for DownloadStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let archived = match self {
            DownloadStatus::AlreadyPresent => DownloadStatus::Succeeded,
            other => *other,
        };
        serializer.serialize_str(archived.as_str())
    }
}

/// Archived statuses describe a previous run. The name is validated but every
/// resource read back starts over as `NotAttempted` so the next run checks the
/// disk again.
impl<'de> Deserialize<'de> for DownloadStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        match DownloadStatus::from_name(&name) {
            Some(_) => Ok(DownloadStatus::NotAttempted),
            None => Err(de::Error::unknown_variant(
                &name,
                &["NotAttempted", "AlreadyPresent", "Succeeded", "Failed"],
            )),
        }
    }
}

/// One media reference found in a post body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PostResource {
    original_url: String,
    post_relative_path: String,
    #[serde(default, skip_serializing_if = "is_not_attempted")]
    download_status: DownloadStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    attempted_download_uris: Vec<Url>,
}

fn is_not_attempted(status: &DownloadStatus) -> bool {
    *status == DownloadStatus::NotAttempted
}

impl PostResource {
    pub fn new(original_url: impl Into<String>, post_relative_path: impl Into<String>) -> Self {
        Self {
            original_url: original_url.into(),
            post_relative_path: post_relative_path.into(),
            download_status: DownloadStatus::NotAttempted,
            attempted_download_uris: Vec::new(),
        }
    }

    pub fn original_url(&self) -> &str {
        &self.original_url
    }

    pub fn post_relative_path(&self) -> &str {
        &self.post_relative_path
    }

    pub fn download_status(&self) -> DownloadStatus {
        self.download_status
    }

    pub fn attempted_download_uris(&self) -> &[Url] {
        &self.attempted_download_uris
    }

    /// Records the fetch outcome. A resource that already reached a terminal
    /// status is returned unchanged.
    pub fn with_download_status(&self, status: DownloadStatus, attempted: Vec<Url>) -> Self {
        if self.download_status.is_terminal() {
            return self.clone();
        }
        Self {
            original_url: self.original_url.clone(),
            post_relative_path: self.post_relative_path.clone(),
            download_status: status,
            attempted_download_uris: attempted,
        }
    }
}
