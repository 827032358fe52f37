use std::path::PathBuf;

use blogport_core::OutputFormat;
use clap::{ArgAction, Args, Parser};

/// Export a blog's posts and media to portable content files.
#[derive(Debug, Parser)]
#[command(name = "blogport", version)]
pub struct Cli {
    /// Archive written by a previous export (`--serialize-json`)
    #[arg(value_name = "ARCHIVE_FILE")]
    pub archive: Option<PathBuf>,

    #[command(flatten)]
    pub mysql: MysqlArgs,

    /// Directory for posts and images [default: posts]
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output format: markdown | html | raw [default: markdown]
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Serialize the entire post set to FILE
    #[arg(long, value_name = "FILE")]
    pub serialize_json: Option<PathBuf>,

    /// Resolve relative media references against URI
    #[arg(long, value_name = "URI")]
    pub base_uri: Option<String>,

    /// JSON configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase logging verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short = 'q', long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Also write the log to FILE
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Default, Args)]
#[command(next_help_heading = "MySQL Options")]
pub struct MysqlArgs {
    /// Connect to host
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Connect through port
    #[arg(short = 'P', long)]
    pub port: Option<u16>,

    /// User for login
    #[arg(short = 'u', long)]
    pub user: Option<String>,

    /// Password to use
    #[arg(short = 'p', long)]
    pub password: Option<String>,

    /// Database to use
    #[arg(short = 'D', long)]
    pub database: Option<String>,

    /// Table name prefix [default: wp_]
    #[arg(long, value_name = "PREFIX")]
    pub table_prefix: Option<String>,

    /// Ignore unsupported database versions
    #[arg(short = 'i', long = "ignore-unsupported-db-versions")]
    pub ignore_unsupported_db_versions: bool,
}

impl MysqlArgs {
    pub fn any_connection_flag(&self) -> bool {
        self.host.is_some()
            || self.port.is_some()
            || self.user.is_some()
            || self.password.is_some()
            || self.database.is_some()
            || self.table_prefix.is_some()
    }
}

impl Cli {
    /// Verbosity level: 0 is quiet, 1 the default.
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose.saturating_add(1)
        }
    }
}
