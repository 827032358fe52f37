mod cli;
mod config;
mod logging;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use blogport_engine::{
    ArchivePostSource, DefaultDelegate, ExportDelegate, ExportError, ExportRun, Exporter,
    FetchSettings, MysqlPostSource, PostSource, ReqwestFetcher, SourceError, SubstitutingDelegate,
};
use blogport_logging::{export_debug, export_error, export_info, export_warn};
use clap::{CommandFactory, Parser};
use tokio_util::sync::CancellationToken;

use cli::Cli;
use config::{ConfigError, FileConfig, RunSettings, SourceSelection};

const EXIT_FAILURE: u8 = 1;
const EXIT_CANCELLED: u8 = 130;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(&cli);
    let verbose_errors = cli.verbosity() > 2;

    let settings = match load_settings(&cli) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("error: {err}\n");
            eprintln!("{}", Cli::command().render_usage());
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            export_error!("Failed to start async runtime: {err}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    match runtime.block_on(run(settings)) {
        Ok(run) => {
            export_info!(
                "Exported {} posts to {}",
                run.posts.len(),
                run.config.content_dir.display()
            );
            ExitCode::SUCCESS
        }
        Err(err) => report_failure(&err, verbose_errors),
    }
}

fn load_settings(cli: &Cli) -> Result<RunSettings, ConfigError> {
    let file = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    RunSettings::resolve(cli, file)
}

async fn run(settings: RunSettings) -> anyhow::Result<ExportRun> {
    let cancel = CancellationToken::new();
    let watcher = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            export_warn!("Interrupted, cancelling export");
            watcher.cancel();
        }
    });

    let delegate: Arc<dyn ExportDelegate> = if settings.patterns.is_empty() {
        Arc::new(DefaultDelegate)
    } else {
        export_debug!("Applying {} replace patterns", settings.patterns.len());
        Arc::new(SubstitutingDelegate::new(
            Arc::new(DefaultDelegate),
            settings.patterns,
        ))
    };

    let source: Box<dyn PostSource> = match settings.source {
        SourceSelection::Archive(path) => {
            export_debug!("Reading archive {}", path.display());
            Box::new(ArchivePostSource::new(path))
        }
        SourceSelection::Mysql {
            params,
            ignore_unsupported_db_versions,
        } => {
            let source = MysqlPostSource::new(params, ignore_unsupported_db_versions);
            export_debug!(
                "MySQL connection string: {}",
                source.params().to_connection_string(true)
            );
            Box::new(source)
        }
    };

    let exporter = Exporter::new(
        settings.export,
        delegate,
        Arc::new(ReqwestFetcher::new(FetchSettings::default())),
    );
    exporter
        .run(source.as_ref(), &cancel)
        .await
        .context("export failed")
}

fn report_failure(err: &anyhow::Error, verbose: bool) -> ExitCode {
    match err.downcast_ref::<ExportError>() {
        Some(ExportError::Cancelled) => {
            export_warn!("Export cancelled; files written so far are kept");
            return ExitCode::from(EXIT_CANCELLED);
        }
        Some(ExportError::Source(SourceError::Connection(cause))) => {
            export_error!("Cannot connect to database: {cause}");
        }
        _ => export_error!("{err:#}"),
    }
    if verbose {
        eprintln!("{err:?}");
    }
    ExitCode::from(EXIT_FAILURE)
}
