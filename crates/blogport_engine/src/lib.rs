//! Blogport engine: post sources, the transform pipeline and all export IO.
mod archive;
mod convert;
mod delegate;
mod export;
mod fetch;
pub mod filename;
pub mod frontmatter;
mod persist;
pub mod resources;
pub mod source;
pub mod transform;
mod types;

pub use archive::{write_archive, ArchiveError};
pub use convert::{Converter, Html2MdConverter};
pub use delegate::{process_post, DefaultDelegate, ExportDelegate, ReplacePattern, SubstitutingDelegate};
pub use export::{ExportConfig, ExportError, ExportRun, Exporter, PostPair};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher};
pub use frontmatter::PreambleStyle;
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use source::{ArchivePostSource, MysqlPostSource, PostSource, PostStream, SourceError};
pub use types::{FailureKind, FetchError};
