use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Target text format of the exported content files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Content exactly as stored, apart from rewritten media references.
    Raw,
    /// Content with inferred paragraph markup.
    Html,
    /// Content converted to markdown.
    #[default]
    Markdown,
}

impl OutputFormat {
    /// File extension (without the dot) for content files of this format.
    pub fn file_extension(self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Raw | OutputFormat::Html => "html",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Raw => "raw",
            OutputFormat::Html => "html",
            OutputFormat::Markdown => "markdown",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown output format `{0}` (expected raw, html or markdown)")]
pub struct ParseFormatError(pub String);

impl FromStr for OutputFormat {
    type Err = ParseFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(OutputFormat::Raw),
            "html" => Ok(OutputFormat::Html),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(ParseFormatError(s.to_string())),
        }
    }
}
