//! Candidate resolution and idempotent download of post resources.
use std::path::{Component, Path};

use blogport_core::{DownloadStatus, PostResource};
use blogport_logging::{export_debug, export_error, export_info};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::export::ExportConfig;
use crate::fetch::Fetcher;
use crate::types::FetchError;

/// Download candidates for a resource reference.
///
/// Protocol-relative references get an `https:` scheme. With a base URI the
/// reference is resolved against it, otherwise it must be absolute. A
/// reference that cannot be parsed has no candidates.
pub fn download_uris(config: &ExportConfig, resource: &PostResource) -> Vec<Url> {
    let reference = resource.original_url().trim();
    let reference = if reference.starts_with("//") {
        format!("https:{reference}")
    } else {
        reference.to_string()
    };

    let parsed = match &config.base_uri {
        Some(base) => base.join(&reference),
        None => Url::parse(&reference),
    };
    match parsed {
        Ok(url) => vec![url],
        Err(err) => {
            export_debug!("No download candidate for {}: {err}", resource.original_url());
            Vec::new()
        }
    }
}

/// Materializes a resource under the content root, trying each candidate in
/// order.
///
/// Terminal resources are returned unchanged and an existing destination
/// file short-circuits to `AlreadyPresent` without any request. Failures are
/// logged and recorded on the returned resource, never raised. A relative
/// path that could leave the content root fails without any request.
pub async fn download_resource(
    config: &ExportConfig,
    fetcher: &dyn Fetcher,
    resource: &PostResource,
    candidates: Vec<Url>,
    cancel: &CancellationToken,
) -> PostResource {
    if resource.download_status().is_terminal() {
        return resource.clone();
    }

    if !stays_inside_root(resource.post_relative_path()) {
        export_error!(
            "    Refusing to download {} to {}: path leaves the content directory",
            resource.original_url(),
            resource.post_relative_path()
        );
        return resource.with_download_status(DownloadStatus::Failed, Vec::new());
    }

    let destination = config.content_dir.join(resource.post_relative_path());
    if destination.exists() {
        export_debug!("  Resource {} already present", destination.display());
        return resource.with_download_status(DownloadStatus::AlreadyPresent, candidates);
    }

    let mut status = DownloadStatus::Failed;
    let mut failures: Vec<(&Url, FetchError)> = Vec::new();
    for uri in &candidates {
        export_info!("  Resource {uri} -> {}", destination.display());
        match fetcher.fetch_to_file(uri, &destination, cancel).await {
            Ok(bytes) => {
                export_debug!("  Downloaded {bytes} bytes from {uri}");
                status = DownloadStatus::Succeeded;
                break;
            }
            Err(err) => {
                let cancelled = err.is_cancelled();
                failures.push((uri, err));
                if cancelled {
                    break;
                }
            }
        }
    }

    for (uri, err) in failures {
        export_error!("    Failed to download {uri}: {err}");
    }
    if candidates.is_empty() {
        export_error!("    No download candidates for {}", resource.original_url());
    }

    resource.with_download_status(status, candidates)
}

fn stays_inside_root(relative: &str) -> bool {
    let path = Path::new(relative);
    path.components().next().is_some()
        && path
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
}
