use std::path::PathBuf;

use blogport_core::{OutputFormat, PostRecord};
use blogport_engine::filename::post_file_stem;
use blogport_engine::frontmatter::{populate_preamble, write_post};
use blogport_engine::{DefaultDelegate, ExportConfig, ExportDelegate, PreambleStyle};
use chrono::DateTime;
use pretty_assertions::assert_eq;
use serde_yaml::{Mapping, Value};

fn published_post() -> PostRecord {
    PostRecord::new(42, "hello", "Hello, World")
        .with_status("publish")
        .with_published(Some(
            DateTime::parse_from_rfc3339("2020-03-05T12:30:00+02:00").unwrap(),
        ))
        .with_tags(["Rust", "Blog"])
        .with_category(Some("Notes".to_string()))
        .with_redirect_from(vec!["/2020/03/hello/".to_string()])
        .with_content("Body")
}

fn preamble_of(document: &str) -> Mapping {
    let rest = document.strip_prefix("---\n").expect("opening delimiter");
    let (yaml, _) = rest.split_once("\n---\n").expect("closing delimiter");
    serde_yaml::from_str(yaml).unwrap()
}

fn get<'a>(mapping: &'a Mapping, key: &str) -> Option<&'a Value> {
    mapping.get(key)
}

#[test]
fn file_stem_is_date_and_safe_slug() {
    let date = DateTime::parse_from_rfc3339("2020-03-05T12:30:00+02:00").unwrap();
    assert_eq!(post_file_stem(Some(&date), "hello", 1), "2020-03-05-hello");
    assert_eq!(post_file_stem(Some(&date), "a/b:c?", 1), "2020-03-05-a_b_c");
    assert_eq!(post_file_stem(Some(&date), "", 7), "2020-03-05-post-7");
    assert_eq!(post_file_stem(None, "CON", 1), "CON_");
}

#[test]
fn output_path_appends_extension() {
    let config = ExportConfig::default_with_output("content");
    let post = published_post().with_slug("v1.2-notes");
    let extension = DefaultDelegate.file_extension(&config, &post);
    assert_eq!(extension, "md");
    assert_eq!(
        DefaultDelegate.output_path(&config, &post, &extension),
        PathBuf::from("content").join("2020-03-05-v1.2-notes.md")
    );

    let mut html = config.clone();
    html.output_format = OutputFormat::Raw;
    assert_eq!(DefaultDelegate.file_extension(&html, &post), "html");
}

#[test]
fn preamble_carries_post_metadata() {
    let mapping = populate_preamble(&published_post());

    assert_eq!(get(&mapping, "Title").and_then(Value::as_str), Some("Hello, World"));
    assert_eq!(
        get(&mapping, "Date").and_then(Value::as_str),
        Some("2020-03-05 12:30:00+02:00")
    );
    assert_eq!(get(&mapping, "Category").and_then(Value::as_str), Some("Notes"));
    assert_eq!(
        get(&mapping, "Tags"),
        Some(&Value::Sequence(vec![
            Value::String("rust".to_string()),
            Value::String("blog".to_string()),
        ]))
    );
    assert_eq!(
        get(&mapping, "RedirectFrom"),
        Some(&Value::Sequence(vec![Value::String("2020/03/hello/".to_string())]))
    );
    assert_eq!(get(&mapping, "Status").and_then(Value::as_str), Some("publish"));
    assert_eq!(get(&mapping, "Excluded"), None);
    assert_eq!(get(&mapping, "Updated"), None);
}

#[test]
fn drafts_are_marked_excluded() {
    let draft = published_post()
        .with_status("draft")
        .with_redirect_from(vec!["/".to_string()]);
    let mapping = populate_preamble(&draft);

    assert_eq!(get(&mapping, "Excluded").and_then(Value::as_str), Some("true"));
    assert_eq!(get(&mapping, "Status").and_then(Value::as_str), Some("draft"));
    assert_eq!(get(&mapping, "RedirectFrom"), None);
}

#[test]
fn written_post_has_preamble_blank_line_and_body() {
    let config = ExportConfig::default_with_output("content");
    let mut out = Vec::new();
    DefaultDelegate
        .write_post(&config, &published_post(), &mut out)
        .unwrap();
    let document = String::from_utf8(out).unwrap();

    assert!(document.starts_with("---\n"));
    assert!(document.ends_with("---\n\nBody\n"));
    let mapping = preamble_of(&document);
    assert_eq!(get(&mapping, "Title").and_then(Value::as_str), Some("Hello, World"));
}

#[test]
fn body_line_endings_are_normalized() {
    let mut out = Vec::new();
    write_post(&mut out, None, "one\r\ntwo\rthree").unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "one\ntwo\nthree\n");
}

#[test]
fn preamble_style_controls_delimiters() {
    let style = PreambleStyle {
        opening: "<!--".to_string(),
        closing: "-->".to_string(),
        blank_line_after: false,
    };
    let mut mapping = Mapping::new();
    mapping.insert(Value::String("Title".into()), Value::String("T".into()));
    let mut out = Vec::new();
    write_post(&mut out, Some((&style, &mapping)), "Body").unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "<!--\nTitle: T\n-->\nBody\n");
}
