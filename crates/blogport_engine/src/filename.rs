use chrono::{DateTime, FixedOffset};

const MAX_SLUG_LEN: usize = 120;

/// Deterministic, file-system safe stem for a post: `{YYYY-MM-DD}-{slug}`.
///
/// Posts without a publish date use the slug alone; an empty slug falls back
/// to `post-{id}`.
pub fn post_file_stem(published: Option<&DateTime<FixedOffset>>, slug: &str, id: u64) -> String {
    let mut name = sanitize_slug(slug);
    if name.is_empty() {
        name = format!("post-{id}");
    }
    match published {
        Some(date) => format!("{}-{name}", date.format("%Y-%m-%d")),
        None => name,
    }
}

fn sanitize_slug(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]);

    // Collapse multiple underscores
    let mut compacted = String::with_capacity(cleaned.len());
    let mut prev_underscore = false;
    for c in cleaned.chars() {
        if c == '_' {
            if !prev_underscore {
                compacted.push(c);
            }
            prev_underscore = true;
        } else {
            compacted.push(c);
            prev_underscore = false;
        }
    }

    if compacted.len() > MAX_SLUG_LEN {
        let mut end = MAX_SLUG_LEN;
        while !compacted.is_char_boundary(end) {
            end -= 1;
        }
        compacted.truncate(end);
    }
    if is_reserved_windows_name(&compacted) {
        compacted.push('_');
    }
    compacted
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}
