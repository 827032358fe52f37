//! Content file rendering: the structured preamble followed by the post body.
use std::io::{self, Write};

use blogport_core::{format_preamble_date, PostRecord};
use serde_yaml::{Mapping, Value};

/// Delimiters framing the preamble block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreambleStyle {
    pub opening: String,
    pub closing: String,
    pub blank_line_after: bool,
}

impl Default for PreambleStyle {
    fn default() -> Self {
        Self {
            opening: "---".to_string(),
            closing: "---".to_string(),
            blank_line_after: true,
        }
    }
}

fn key(name: &str) -> Value {
    Value::String(name.to_string())
}

fn string_sequence<'a>(items: impl IntoIterator<Item = &'a str>) -> Value {
    Value::Sequence(
        items
            .into_iter()
            .map(|item| Value::String(item.to_string()))
            .collect(),
    )
}

/// Default preamble fields of a post. Empty or absent values are left out.
pub fn populate_preamble(post: &PostRecord) -> Mapping {
    let mut mapping = Mapping::new();

    if !post.title().is_empty() {
        mapping.insert(key("Title"), Value::String(post.title().to_string()));
    }
    if let Some(published) = post.published() {
        mapping.insert(key("Date"), Value::String(format_preamble_date(&published)));
    }
    if let Some(updated) = post.updated() {
        mapping.insert(key("Updated"), Value::String(format_preamble_date(&updated)));
    }
    if let Some(category) = post.category() {
        mapping.insert(key("Category"), Value::String(category.to_string()));
    }
    if !post.tags().is_empty() {
        mapping.insert(key("Tags"), string_sequence(post.tags().iter().map(String::as_str)));
    }
    if !post.is_published() {
        mapping.insert(key("Excluded"), Value::String("true".to_string()));
    }
    if !post.status().is_empty() {
        mapping.insert(key("Status"), Value::String(post.status().to_string()));
    }

    let redirects: Vec<&str> = post
        .redirect_from()
        .iter()
        .map(|path| path.trim_start_matches('/'))
        .filter(|path| !path.is_empty())
        .collect();
    if !redirects.is_empty() {
        mapping.insert(key("RedirectFrom"), string_sequence(redirects));
    }

    mapping
}

pub fn write_preamble(
    writer: &mut dyn Write,
    style: &PreambleStyle,
    preamble: &Mapping,
) -> io::Result<()> {
    writeln!(writer, "{}", style.opening)?;
    if !preamble.is_empty() {
        let yaml = serde_yaml::to_string(preamble).map_err(io::Error::other)?;
        writer.write_all(yaml.as_bytes())?;
        if !yaml.ends_with('\n') {
            writeln!(writer)?;
        }
    }
    writeln!(writer, "{}", style.closing)?;
    if style.blank_line_after {
        writeln!(writer)?;
    }
    Ok(())
}

/// Writes one content file: the optional preamble, then the body with line
/// endings normalized to `\n` and a trailing newline.
pub fn write_post(
    writer: &mut dyn Write,
    preamble: Option<(&PreambleStyle, &Mapping)>,
    body: &str,
) -> io::Result<()> {
    if let Some((style, mapping)) = preamble {
        write_preamble(writer, style, mapping)?;
    }
    let body = body.replace("\r\n", "\n").replace('\r', "\n");
    writer.write_all(body.as_bytes())?;
    writeln!(writer)?;
    writer.flush()
}
