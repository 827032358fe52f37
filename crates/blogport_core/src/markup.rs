use std::sync::OnceLock;

use regex::Regex;

fn block_tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^</?(p|div|ul|ol|li|blockquote|h[1-6]|dl|dt|dd|hr)\b")
            .expect("static block tag pattern")
    })
}

fn starts_with_ignore_case(line: &str, prefix: &str) -> bool {
    line.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

fn ends_with_ignore_case(line: &str, suffix: &str) -> bool {
    line.len() >= suffix.len()
        && line
            .get(line.len() - suffix.len()..)
            .is_some_and(|tail| tail.eq_ignore_ascii_case(suffix))
}

/// Infers paragraph markup for content authored with blank-line paragraph
/// breaks.
///
/// Each line outside a `<pre>` block that does not already open or close a
/// block-level element is trimmed and wrapped in `<p>`. Blank lines stay blank, lines
/// inside `<pre>` are kept verbatim, and the result is trimmed.
pub fn add_missing_paragraphs(content: &str) -> String {
    let mut html = String::with_capacity(content.len() + content.len() / 4);
    let mut in_pre = false;

    for raw_line in content.split('\n') {
        let raw_line = raw_line.strip_suffix('\r').unwrap_or(raw_line);
        let line = raw_line.trim();

        if starts_with_ignore_case(line, "<pre") {
            in_pre = true;
        }

        if in_pre {
            html.push_str(raw_line);
        } else if !line.is_empty() && !block_tag_pattern().is_match(line) {
            html.push_str("<p>");
            html.push_str(line);
            html.push_str("</p>");
        } else {
            html.push_str(line);
        }
        html.push('\n');

        if ends_with_ignore_case(line, "</pre>") {
            in_pre = false;
        }
    }

    html.trim().to_string()
}
