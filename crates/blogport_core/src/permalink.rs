use std::sync::OnceLock;

use chrono::{DateTime, FixedOffset};
use regex::{Captures, Regex};

use crate::post::PostId;

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new("%([^%]+)%").expect("static permalink pattern"))
}

/// Expands a permalink template such as `/%year%/%monthnum%/%postname%/`.
///
/// Tokens are matched case-insensitively against the post's local publish
/// time, identifier and slug. Unknown tokens are emitted without their `%`
/// delimiters. An empty template yields `None`.
pub fn expand_permalink(
    template: &str,
    published: &DateTime<FixedOffset>,
    id: PostId,
    slug: &str,
) -> Option<String> {
    if template.is_empty() {
        return None;
    }

    let expanded = token_pattern().replace_all(template, |caps: &Captures| {
        let key = &caps[1];
        match key.to_lowercase().as_str() {
            "year" => published.format("%Y").to_string(),
            "monthnum" => published.format("%m").to_string(),
            "day" => published.format("%d").to_string(),
            "hour" => published.format("%H").to_string(),
            "minute" => published.format("%M").to_string(),
            "second" => published.format("%S").to_string(),
            "post_id" => id.to_string(),
            "postname" => slug.to_string(),
            _ => key.to_string(),
        }
    });

    Some(expanded.into_owned())
}
