//! Logger setup for the command-line tool.
//!
//! Logs go to the terminal, and additionally to `--log-file` when given.

use blogport_logging::{initialize, level_for_verbosity, LogDestination};

use crate::cli::Cli;

pub fn init(cli: &Cli) {
    let destination = match &cli.log_file {
        Some(path) => LogDestination::TerminalAndFile(path.clone()),
        None => LogDestination::Terminal,
    };
    initialize(level_for_verbosity(cli.verbosity()), destination);
}
