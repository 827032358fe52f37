use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use blogport_core::{OutputFormat, PostRecord, PostResource};
use serde_yaml::Mapping;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::convert::{Converter, Html2MdConverter};
use crate::export::ExportConfig;
use crate::fetch::Fetcher;
use crate::filename::post_file_stem;
use crate::frontmatter::{self, PreambleStyle};
use crate::{resources, transform};

/// Customization points of an export run.
///
/// Every method has a default that calls the matching free function, so an
/// implementation only overrides the stages it cares about. `process_post`
/// drives the transform stages through `self`, which means overriding a single
/// stage is picked up by the default pipeline.
#[async_trait]
pub trait ExportDelegate: Send + Sync {
    fn process_post(&self, config: &ExportConfig, post: PostRecord) -> PostRecord {
        process_post(self, config, post)
    }

    fn rewrite_image_sources(&self, config: &ExportConfig, post: PostRecord) -> PostRecord {
        transform::rewrite_image_sources(config, post)
    }

    fn normalize_markup(&self, _config: &ExportConfig, post: PostRecord) -> PostRecord {
        transform::normalize_markup(post)
    }

    fn converter(&self) -> &dyn Converter {
        &Html2MdConverter
    }

    fn convert_to_markdown(&self, _config: &ExportConfig, post: PostRecord) -> PostRecord {
        transform::convert_to_markdown(self.converter(), post)
    }

    fn file_extension(&self, config: &ExportConfig, _post: &PostRecord) -> String {
        config.output_format.file_extension().to_string()
    }

    /// Output file for a post. The extension is appended, never substituted.
    fn output_path(&self, config: &ExportConfig, post: &PostRecord, extension: &str) -> PathBuf {
        let stem = post_file_stem(post.published().as_ref(), post.slug(), post.id());
        config.content_dir.join(format!("{stem}.{extension}"))
    }

    fn open_output(&self, path: &Path) -> io::Result<Box<dyn Write + Send>> {
        Ok(Box::new(BufWriter::new(File::create(path)?)))
    }

    /// `None` writes the body without a preamble.
    fn preamble_style(&self) -> Option<PreambleStyle> {
        Some(PreambleStyle::default())
    }

    fn populate_preamble(&self, _config: &ExportConfig, post: &PostRecord) -> Mapping {
        frontmatter::populate_preamble(post)
    }

    fn write_post(
        &self,
        config: &ExportConfig,
        post: &PostRecord,
        writer: &mut dyn Write,
    ) -> io::Result<()> {
        match self.preamble_style() {
            Some(style) => {
                let preamble = self.populate_preamble(config, post);
                frontmatter::write_post(writer, Some((&style, &preamble)), post.content())
            }
            None => frontmatter::write_post(writer, None, post.content()),
        }
    }

    fn download_uris(&self, config: &ExportConfig, resource: &PostResource) -> Vec<Url> {
        resources::download_uris(config, resource)
    }

    async fn download_resource(
        &self,
        config: &ExportConfig,
        fetcher: &dyn Fetcher,
        resource: &PostResource,
        cancel: &CancellationToken,
    ) -> PostResource {
        let candidates = self.download_uris(config, resource);
        resources::download_resource(config, fetcher, resource, candidates, cancel).await
    }

    /// Which side of a processed pair goes into the archive.
    fn archive_post(&self, original: &PostRecord, _processed: &PostRecord) -> PostRecord {
        original.clone()
    }
}

/// Default stage order: rewrite media references, then (unless raw) infer
/// paragraphs, then (for markdown) convert.
pub fn process_post<D>(delegate: &D, config: &ExportConfig, post: PostRecord) -> PostRecord
where
    D: ExportDelegate + ?Sized,
{
    let post = delegate.rewrite_image_sources(config, post);
    match config.output_format {
        OutputFormat::Raw => post,
        OutputFormat::Html => delegate.normalize_markup(config, post),
        OutputFormat::Markdown => {
            let post = delegate.normalize_markup(config, post);
            delegate.convert_to_markdown(config, post)
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultDelegate;

impl ExportDelegate for DefaultDelegate {}

/// Literal text replacement applied to post content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacePattern {
    pub needle: String,
    pub substitute: String,
}

/// Wraps another delegate and applies replace patterns to the content after
/// the wrapped delegate processed the post. All other behavior is the wrapped
/// delegate's.
pub struct SubstitutingDelegate {
    inner: Arc<dyn ExportDelegate>,
    patterns: Vec<ReplacePattern>,
}

impl SubstitutingDelegate {
    pub fn new(inner: Arc<dyn ExportDelegate>, patterns: Vec<ReplacePattern>) -> Self {
        Self { inner, patterns }
    }

    fn substitute(&self, content: &str) -> String {
        self.patterns
            .iter()
            .filter(|pattern| !pattern.needle.is_empty())
            .fold(content.to_string(), |acc, pattern| {
                acc.replace(&pattern.needle, &pattern.substitute)
            })
    }
}

#[async_trait]
impl ExportDelegate for SubstitutingDelegate {
    fn process_post(&self, config: &ExportConfig, post: PostRecord) -> PostRecord {
        let post = self.inner.process_post(config, post);
        let content = self.substitute(post.content());
        post.with_content(content)
    }

    fn rewrite_image_sources(&self, config: &ExportConfig, post: PostRecord) -> PostRecord {
        self.inner.rewrite_image_sources(config, post)
    }

    fn normalize_markup(&self, config: &ExportConfig, post: PostRecord) -> PostRecord {
        self.inner.normalize_markup(config, post)
    }

    fn converter(&self) -> &dyn Converter {
        self.inner.converter()
    }

    fn convert_to_markdown(&self, config: &ExportConfig, post: PostRecord) -> PostRecord {
        self.inner.convert_to_markdown(config, post)
    }

    fn file_extension(&self, config: &ExportConfig, post: &PostRecord) -> String {
        self.inner.file_extension(config, post)
    }

    fn output_path(&self, config: &ExportConfig, post: &PostRecord, extension: &str) -> PathBuf {
        self.inner.output_path(config, post, extension)
    }

    fn open_output(&self, path: &Path) -> io::Result<Box<dyn Write + Send>> {
        self.inner.open_output(path)
    }

    fn preamble_style(&self) -> Option<PreambleStyle> {
        self.inner.preamble_style()
    }

    fn populate_preamble(&self, config: &ExportConfig, post: &PostRecord) -> Mapping {
        self.inner.populate_preamble(config, post)
    }

    fn write_post(
        &self,
        config: &ExportConfig,
        post: &PostRecord,
        writer: &mut dyn Write,
    ) -> io::Result<()> {
        self.inner.write_post(config, post, writer)
    }

    fn download_uris(&self, config: &ExportConfig, resource: &PostResource) -> Vec<Url> {
        self.inner.download_uris(config, resource)
    }

    async fn download_resource(
        &self,
        config: &ExportConfig,
        fetcher: &dyn Fetcher,
        resource: &PostResource,
        cancel: &CancellationToken,
    ) -> PostResource {
        self.inner
            .download_resource(config, fetcher, resource, cancel)
            .await
    }

    fn archive_post(&self, original: &PostRecord, processed: &PostRecord) -> PostRecord {
        self.inner.archive_post(original, processed)
    }
}
