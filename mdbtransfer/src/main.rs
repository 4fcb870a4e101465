//! Access to PostgreSQL transfer tool.
//!
//! Reads every table of a legacy desktop database file and loads it into a
//! PostgreSQL database, one table at a time.
//!
//! # Guarantees
//! - Each listed table is attempted exactly once per run
//! - One failing table never stops the others
//! - ID-controlled tables never receive a key twice
//! - Credentials are never logged

use anyhow::Context;
use clap::Parser;
use mdbtransfer::output::render;
use mdbtransfer::progress::LogProgress;
use mdbtransfer::{
    CredentialSource, SourceArgs, build_transfer_config, destination_config, get_database_url,
};
use mdbtransfer::{Cli, Command, TransferArgs};
use mdbtransfer_core::{
    TransferOrchestrator, TransferSummary, check_destination, check_source_file,
    create_destination, create_reader, init_logging,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.quiet)
        .context("Failed to initialize logging")?;

    match &cli.command {
        Command::Transfer(args) => transfer(args, cli.global.database_url_file.clone()).await,
        Command::Check => check(cli.global.database_url_file.clone()).await,
        Command::Tables(args) => list_tables(&args.source).await,
    }
}

fn resolve_url(database_url_file: Option<PathBuf>) -> anyhow::Result<String> {
    let (url, source) = get_database_url(database_url_file)?;
    match source {
        CredentialSource::Environment => debug!("Database URL loaded from environment"),
        CredentialSource::File(path) => {
            debug!("Database URL loaded from file: {}", path.display());
        }
    }
    Ok(url)
}

/// Runs a full transfer and prints the results.
async fn transfer(
    args: &TransferArgs,
    database_url_file: Option<PathBuf>,
) -> anyhow::Result<ExitCode> {
    let url = resolve_url(database_url_file)?;
    let config = build_transfer_config(args, url)?;

    info!("Source: {}", args.source.file.display());
    info!("Destination: {}", config.destination.redacted_url());

    let results = TransferOrchestrator::new(&config)
        .run(&args.source.file, &LogProgress)
        .await;

    let summary = TransferSummary::from_results(&results);
    println!("{}", render(args.format, &results)?);

    if summary.has_errors() {
        error!("{} of {} results are errors", summary.failed, summary.tables);
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Tests the destination connection without touching any table.
async fn check(database_url_file: Option<PathBuf>) -> anyhow::Result<ExitCode> {
    let url = resolve_url(database_url_file)?;
    let config = destination_config(url, None);
    config.validate()?;

    info!("Testing connection to {}", config.redacted_url());
    let destination = create_destination(&config)?;
    let report = check_destination(destination.as_ref()).await;
    destination.close().await;

    if report.ok {
        println!("Connection successful: {}", report.message);
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("Connection failed: {}", report.message);
        Ok(ExitCode::FAILURE)
    }
}

/// Prints the tables of a source file, one per line.
async fn list_tables(args: &SourceArgs) -> anyhow::Result<ExitCode> {
    let size = check_source_file(&args.file, args.max_file_size)?;
    debug!("{} is {} bytes", args.file.display(), size);

    let reader = create_reader(&args.file, &args.source_config())?;
    info!("Using {} reader", reader.kind());

    let tables = reader.list_tables().await;
    reader.close().await;

    for table in tables? {
        println!("{table}");
    }
    Ok(ExitCode::SUCCESS)
}
