use std::sync::Arc;

use blogport_core::{OutputFormat, PostRecord};
use blogport_engine::{
    process_post, DefaultDelegate, ExportConfig, ExportDelegate, ReplacePattern,
    SubstitutingDelegate,
};
use pretty_assertions::assert_eq;

fn config(format: OutputFormat) -> ExportConfig {
    let mut config = ExportConfig::default_with_output("out");
    config.output_format = format;
    config
}

fn post(content: &str) -> PostRecord {
    PostRecord::new(1, "hello", "Hello").with_content(content)
}

#[test]
fn image_sources_are_rewritten_and_registered() {
    let post = post(r#"<p>x <img class="wide" src="http://example.com/wp/a.png?w=300" alt="a"></p>"#);
    let processed = DefaultDelegate.rewrite_image_sources(&config(OutputFormat::Raw), post);

    assert_eq!(
        processed.content(),
        r#"<p>x <img class="wide" src="images/a.png" alt="a"></p>"#
    );
    assert_eq!(processed.resources().len(), 1);
    let resource = &processed.resources()[0];
    assert_eq!(resource.original_url(), "http://example.com/wp/a.png?w=300");
    assert_eq!(resource.post_relative_path(), "images/a.png");
}

#[test]
fn quoted_source_with_spaces_is_kept_whole() {
    let post = post(r#"<img src=" http://example.com/wp/my photo.png " alt="x">"#);
    let processed = DefaultDelegate.rewrite_image_sources(&config(OutputFormat::Raw), post);

    assert_eq!(
        processed.content(),
        r#"<img src="images/my photo.png" alt="x">"#
    );
    assert_eq!(processed.resources().len(), 1);
    let resource = &processed.resources()[0];
    assert_eq!(resource.original_url(), "http://example.com/wp/my photo.png");
    assert_eq!(resource.post_relative_path(), "images/my photo.png");
}

#[test]
fn repeated_reference_is_registered_once() {
    let post = post("<img src='/a.png'>\n<img src='/a.png'>\n<img src=/b.gif>");
    let processed = DefaultDelegate.rewrite_image_sources(&config(OutputFormat::Raw), post);

    let paths: Vec<&str> = processed
        .resources()
        .iter()
        .map(|resource| resource.post_relative_path())
        .collect();
    assert_eq!(paths, ["images/a.png", "images/b.gif"]);
    assert_eq!(
        processed.content(),
        "<img src='images/a.png'>\n<img src='images/a.png'>\n<img src=images/b.gif>"
    );
}

#[test]
fn raw_output_only_rewrites_images() {
    let processed = process_post(
        &DefaultDelegate,
        &config(OutputFormat::Raw),
        post("Hello\n\n<img src=\"http://example.com/a.png\">"),
    );
    assert_eq!(processed.content(), "Hello\n\n<img src=\"images/a.png\">");
}

#[test]
fn html_output_adds_missing_paragraphs() {
    let processed = process_post(
        &DefaultDelegate,
        &config(OutputFormat::Html),
        post("Hello\n\n<p>World</p>"),
    );
    assert_eq!(processed.content(), "<p>Hello</p>\n\n<p>World</p>");
}

#[test]
fn markdown_output_is_converted() {
    let processed = process_post(
        &DefaultDelegate,
        &config(OutputFormat::Markdown),
        post("Hello\n\n<p>World</p>"),
    );
    assert!(!processed.content().contains("<p>"));
    assert!(processed.content().starts_with("Hello"));
    assert!(processed.content().ends_with("World"));
}

struct ShoutingDelegate;

impl ExportDelegate for ShoutingDelegate {
    fn normalize_markup(&self, _config: &ExportConfig, post: PostRecord) -> PostRecord {
        let content = post.content().to_uppercase();
        post.with_content(content)
    }
}

#[test]
fn overridden_stage_is_used_by_default_pipeline() {
    let processed = ShoutingDelegate.process_post(&config(OutputFormat::Html), post("hello"));
    assert_eq!(processed.content(), "HELLO");
}

#[test]
fn substitutions_apply_after_default_processing() {
    let delegate = SubstitutingDelegate::new(
        Arc::new(DefaultDelegate),
        vec![
            ReplacePattern {
                needle: "<p>World</p>".to_string(),
                substitute: "<p>Earth</p>".to_string(),
            },
            ReplacePattern {
                needle: "http://".to_string(),
                substitute: "https://".to_string(),
            },
        ],
    );
    let processed = delegate.process_post(
        &config(OutputFormat::Html),
        post("World\n<a href=\"http://example.com\">x</a>"),
    );
    assert_eq!(
        processed.content(),
        "<p>Earth</p>\n<p><a href=\"https://example.com\">x</a></p>"
    );
}

#[test]
fn substituting_delegate_keeps_wrapped_overrides() {
    let delegate = SubstitutingDelegate::new(Arc::new(ShoutingDelegate), Vec::new());
    let processed = delegate.process_post(&config(OutputFormat::Html), post("hello"));
    assert_eq!(processed.content(), "HELLO");
}
