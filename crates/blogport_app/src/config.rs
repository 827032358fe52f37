use std::fs;
use std::path::{Path, PathBuf};

use blogport_core::{ConnectionParams, OutputFormat};
use blogport_engine::{ExportConfig, ReplacePattern};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::cli::Cli;

const DEFAULT_OUTPUT_DIR: &str = "posts";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot export from both an archive file and a MySQL database")]
    ConflictingSources,
    #[error("no MySQL connection options or archive file provided")]
    NoSource,
    #[error("MySQL connection needs at least a host and a database")]
    IncompleteConnection,
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid base URI {value:?}: {source}")]
    BaseUri {
        value: String,
        source: url::ParseError,
    },
}

/// Literal replacement read from the config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FilePattern {
    pub needle: String,
    #[serde(default)]
    pub substitute: String,
}

/// Optional JSON configuration file. Command-line flags take precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct FileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub table_prefix: Option<String>,
    pub ignore_unsupported_db_versions: bool,
    pub content_output_directory: Option<PathBuf>,
    pub archive_output_file_path: Option<PathBuf>,
    pub format: Option<OutputFormat>,
    pub base_uri: Option<String>,
    #[serde(alias = "Patterns")]
    pub replace_patterns: Vec<FilePattern>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSelection {
    Archive(PathBuf),
    Mysql {
        params: ConnectionParams,
        ignore_unsupported_db_versions: bool,
    },
}

/// Everything a run needs, merged from the config file and the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub source: SourceSelection,
    pub export: ExportConfig,
    pub patterns: Vec<ReplacePattern>,
}

impl RunSettings {
    pub fn resolve(cli: &Cli, file: FileConfig) -> Result<Self, ConfigError> {
        let mysql = &cli.mysql;
        let mut params = ConnectionParams::new();
        params.set_host(mysql.host.clone().or(file.host));
        params.set_port(mysql.port.or(file.port));
        params.set_username(mysql.user.clone().or(file.username));
        params.set_password(mysql.password.clone().or(file.password));
        params.set_database(mysql.database.clone().or(file.database));
        params.set_optional("TablePrefix", mysql.table_prefix.clone().or(file.table_prefix));

        let wants_mysql = mysql.any_connection_flag() || params.iter().next().is_some();
        let source = match (&cli.archive, wants_mysql) {
            (Some(_), true) => return Err(ConfigError::ConflictingSources),
            (Some(archive), false) => SourceSelection::Archive(archive.clone()),
            (None, true) if params.is_configured() => SourceSelection::Mysql {
                params,
                ignore_unsupported_db_versions: mysql.ignore_unsupported_db_versions
                    || file.ignore_unsupported_db_versions,
            },
            (None, true) => return Err(ConfigError::IncompleteConnection),
            (None, false) => return Err(ConfigError::NoSource),
        };

        let base_uri = match cli.base_uri.clone().or(file.base_uri) {
            Some(value) => Some(Url::parse(&value).map_err(|source| ConfigError::BaseUri {
                value: value.clone(),
                source,
            })?),
            None => None,
        };

        let content_dir = cli
            .output_dir
            .clone()
            .or(file.content_output_directory)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
        let mut export = ExportConfig::default_with_output(content_dir);
        export.output_format = cli.format.or(file.format).unwrap_or_default();
        export.base_uri = base_uri;
        export.archive_path = cli
            .serialize_json
            .clone()
            .or(file.archive_output_file_path);

        let patterns = file
            .replace_patterns
            .into_iter()
            .filter(|pattern| !pattern.needle.is_empty())
            .map(|pattern| ReplacePattern {
                needle: pattern.needle,
                substitute: pattern.substitute,
            })
            .collect();

        Ok(Self {
            source,
            export,
            patterns,
        })
    }
}
