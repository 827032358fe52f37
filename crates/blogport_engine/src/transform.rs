//! Default implementations of the content transform stages.
//!
//! Each function takes a post by value and returns the updated post. The
//! stage methods on [`crate::ExportDelegate`] call these unless overridden.
use std::path::{Component, Path};
use std::sync::OnceLock;

use blogport_core::{add_missing_paragraphs, PostRecord, PostResource};
use regex::{Captures, Regex};

use crate::convert::Converter;
use crate::export::ExportConfig;

fn img_src_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)(<img\s(?:[^>]*?\s)?src\s*=\s*)(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#)
            .expect("static img src pattern")
    })
}

/// Points every `<img src>` at the local image directory and registers the
/// referenced media as resources of the post.
///
/// Quoted values may contain spaces; they are trimmed before use.
pub fn rewrite_image_sources(config: &ExportConfig, post: PostRecord) -> PostRecord {
    let mut discovered = Vec::new();
    let content = img_src_regex()
        .replace_all(post.content(), |caps: &Captures| {
            let (quote, value) = match (caps.get(2), caps.get(3), caps.get(4)) {
                (Some(value), _, _) => ("\"", value.as_str()),
                (_, Some(value), _) => ("'", value.as_str()),
                (_, _, Some(value)) => ("", value.as_str()),
                _ => return caps[0].to_string(),
            };
            let reference = value.trim();
            match image_relative_path(&config.images_dir, reference) {
                Some(relative) => {
                    let rewritten = format!("{}{quote}{relative}{quote}", &caps[1]);
                    discovered.push(PostResource::new(reference, relative));
                    rewritten
                }
                None => caps[0].to_string(),
            }
        })
        .into_owned();

    discovered
        .into_iter()
        .fold(post.with_content(content), PostRecord::with_resource)
}

/// Content-relative, `/`-separated location of a referenced image, or `None`
/// when the reference has no usable file name.
pub fn image_relative_path(images_dir: &Path, reference: &str) -> Option<String> {
    if reference.starts_with("data:") {
        return None;
    }
    let without_suffix = reference.split(['?', '#']).next().unwrap_or_default();
    let basename = without_suffix.rsplit(['/', '\\']).next().unwrap_or_default();
    if basename.is_empty() || basename == "." || basename == ".." {
        return None;
    }

    let mut parts: Vec<String> = images_dir
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    parts.push(basename.to_string());
    Some(parts.join("/"))
}

/// Wraps bare text lines in paragraphs. See [`add_missing_paragraphs`].
pub fn normalize_markup(post: PostRecord) -> PostRecord {
    let content = add_missing_paragraphs(post.content());
    post.with_content(content)
}

pub fn convert_to_markdown(converter: &dyn Converter, post: PostRecord) -> PostRecord {
    let content = converter.to_markdown(post.content()).trim().to_string();
    post.with_content(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_path_drops_query_and_fragment() {
        assert_eq!(
            image_relative_path(Path::new("images"), "http://x/a/b.png?w=300#top"),
            Some("images/b.png".to_string())
        );
    }

    #[test]
    fn relative_path_uses_forward_slashes_for_nested_dirs() {
        assert_eq!(
            image_relative_path(Path::new("static/img"), "pic.jpg"),
            Some("static/img/pic.jpg".to_string())
        );
    }

    #[test]
    fn directory_references_have_no_relative_path() {
        assert_eq!(image_relative_path(Path::new("images"), "http://x/dir/"), None);
        assert_eq!(image_relative_path(Path::new("images"), "data:image/png;base64,AAAA"), None);
    }
}
