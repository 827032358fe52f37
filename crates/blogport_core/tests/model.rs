use blogport_core::{
    normalize_category, normalize_tags, DownloadStatus, PostRecord, PostResource,
};
use pretty_assertions::assert_eq;
use url::Url;

#[test]
fn tags_are_lowercased_and_deduplicated_in_first_seen_order() {
    assert_eq!(normalize_tags(["Foo", "foo", "BAR"]), vec!["foo", "bar"]);

    let post = PostRecord::new(1, "slug", "Title").with_tags([" Rust ", "", "rust", "Web"]);
    assert_eq!(post.tags(), ["rust", "web"]);
}

#[test]
fn uncategorized_category_is_absent_in_any_case() {
    for value in ["uncategorized", "Uncategorized", "UNCATEGORIZED", "  uncategorized "] {
        assert_eq!(normalize_category(Some(value.to_string())), None, "{value}");
    }
    assert_eq!(normalize_category(Some(String::new())), None);
    assert_eq!(
        normalize_category(Some("Travel".to_string())).as_deref(),
        Some("Travel")
    );

    let post = PostRecord::new(1, "s", "t").with_category(Some("Uncategorized".into()));
    assert_eq!(post.category(), None);
}

#[test]
fn later_resource_with_same_reference_replaces_earlier_one() {
    let post = PostRecord::new(1, "s", "t")
        .with_resource(PostResource::new("http://x/a.png", "images/old.png"))
        .with_resource(PostResource::new("http://x/b.png", "images/b.png"))
        .with_resource(PostResource::new("http://x/a.png", "images/a.png"));

    let paths: Vec<_> = post
        .resources()
        .iter()
        .map(|r| r.post_relative_path().to_string())
        .collect();
    assert_eq!(paths, vec!["images/b.png", "images/a.png"]);
}

#[test]
fn download_status_only_moves_forward() {
    let uri = Url::parse("https://example.com/a.png").unwrap();
    let resource = PostResource::new("https://example.com/a.png", "images/a.png");
    assert_eq!(resource.download_status(), DownloadStatus::NotAttempted);
    assert!(!resource.download_status().is_terminal());

    let failed = resource.with_download_status(DownloadStatus::Failed, vec![uri.clone()]);
    assert_eq!(failed.download_status(), DownloadStatus::Failed);
    assert_eq!(failed.attempted_download_uris(), [uri]);

    let retried = failed.with_download_status(DownloadStatus::Succeeded, Vec::new());
    assert_eq!(retried, failed);
}

#[test]
fn already_present_is_archived_as_succeeded() {
    let resource = PostResource::new("a.png", "images/a.png")
        .with_download_status(DownloadStatus::AlreadyPresent, Vec::new());
    let json = serde_json::to_value(&resource).unwrap();
    assert_eq!(json["DownloadStatus"], "Succeeded");

    let failed = PostResource::new("b.png", "images/b.png")
        .with_download_status(DownloadStatus::Failed, Vec::new());
    assert_eq!(serde_json::to_value(&failed).unwrap()["DownloadStatus"], "Failed");
}

#[test]
fn archived_status_is_reset_when_read_back() {
    let json = r#"{"OriginalUrl":"a.png","PostRelativePath":"images/a.png","DownloadStatus":"Succeeded"}"#;
    let resource: PostResource = serde_json::from_str(json).unwrap();
    assert_eq!(resource.download_status(), DownloadStatus::NotAttempted);

    let bad = r#"{"OriginalUrl":"a.png","PostRelativePath":"images/a.png","DownloadStatus":"Maybe"}"#;
    assert!(serde_json::from_str::<PostResource>(bad).is_err());
}

#[test]
fn serialization_omits_absent_and_default_fields() {
    let post = PostRecord::new(7, "hello", "Hello").with_content("<p>Hi</p>");
    let json = serde_json::to_value(&post).unwrap();
    let object = json.as_object().unwrap();

    let mut keys: Vec<_> = object.keys().cloned().collect();
    keys.sort();
    assert_eq!(keys, vec!["Content", "Id", "Slug", "Title"]);
}

#[test]
fn deserialization_normalizes_tags_and_accepts_legacy_names() {
    let json = r#"{
        "Id": 3,
        "Status": "publish",
        "Date": "2020-03-05T10:00:00+01:00",
        "Name": "legacy",
        "Title": "Legacy",
        "Category": "uncategorized",
        "Tags": ["Foo", "foo", "BAR"],
        "Content": "body"
    }"#;
    let post: PostRecord = serde_json::from_str(json).unwrap();

    assert_eq!(post.id(), 3);
    assert_eq!(post.slug(), "legacy");
    assert_eq!(post.category(), None);
    assert_eq!(post.tags(), ["foo", "bar"]);
    assert!(post.is_published());
    assert_eq!(
        post.published().unwrap().to_rfc3339(),
        "2020-03-05T10:00:00+01:00"
    );
}
