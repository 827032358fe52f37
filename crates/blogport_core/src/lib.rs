//! Blogport core: post model and the pure text algorithms of the export.
mod connection;
mod format;
mod markup;
mod permalink;
mod post;
mod resource;
mod timestamp;

pub use connection::{mask_connection_string, ConnectionParams};
pub use format::{OutputFormat, ParseFormatError};
pub use markup::add_missing_paragraphs;
pub use permalink::expand_permalink;
pub use post::{normalize_category, normalize_tags, PostId, PostRecord, PUBLISHED_STATUS};
pub use resource::{DownloadStatus, PostResource};
pub use timestamp::{format_preamble_date, from_local_and_utc, parse_db_datetime};
