mod logging;
mod progress;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use log::{info, warn};
use tokio_util::sync::CancellationToken;

use docfetch_engine::{
    read_records, CsvReportSink, Disposition, Engine, FsArtifactStore, ReqwestTransport,
    RunConfig, RunError, TransportSettings,
};
use logging::{initialize, LogDestination};
use progress::TerminalProgress;

/// Fetches a batch of PDF documents listed in a metadata CSV file, trying
/// each record's primary URL first and its fallback URL second, and writes
/// a per-item outcome report.
#[derive(Debug, Parser)]
#[command(name = "docfetch", version)]
struct Cli {
    /// Metadata CSV file with Identifier, PrimaryUrl and FallbackUrl columns.
    metadata: PathBuf,

    /// Directory where fetched documents are stored.
    #[arg(long, default_value = "downloads")]
    output_dir: PathBuf,

    /// Stop after this many documents have been saved.
    #[arg(long, default_value_t = 10)]
    limit: usize,

    /// Re-download artifacts that already exist in the output directory.
    #[arg(long)]
    overwrite: bool,

    /// Per-attempt fetch timeout in seconds.
    #[arg(long, default_value_t = 15)]
    timeout: u64,

    /// Destination of the outcome report CSV.
    #[arg(long, default_value = "report.csv")]
    report: PathBuf,

    /// Also write logs to ./docfetch.log.
    #[arg(long)]
    log_file: bool,

    /// Enable debug-level logging.
    #[arg(long, short)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let destination = if cli.log_file {
        LogDestination::Both
    } else {
        LogDestination::Terminal
    };
    initialize(destination, cli.verbose);

    let config = RunConfig::new(
        cli.limit,
        cli.overwrite,
        Duration::from_secs(cli.timeout),
        cli.report.display().to_string(),
    )
    .context("invalid run configuration")?;

    let records = read_records(&cli.metadata)
        .with_context(|| format!("could not load metadata from {}", cli.metadata.display()))?;
    info!(
        "loaded {} records from {}",
        records.len(),
        cli.metadata.display()
    );

    let transport = Arc::new(ReqwestTransport::new(TransportSettings::default()));
    let store = Arc::new(
        FsArtifactStore::new(cli.output_dir.clone())
            .with_context(|| format!("cannot use output directory {}", cli.output_dir.display()))?,
    );
    let engine = Engine::new(transport, store, Arc::new(CsvReportSink));

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping");
            interrupt.cancel();
        }
    });

    let sink = TerminalProgress;
    match engine.run(&records, &config, &cancel, Some(&sink)).await {
        Ok(rows) => {
            let saved = count(&rows, Disposition::Saved);
            let skipped = count(&rows, Disposition::SkippedAlreadyPresent);
            let failed = count(&rows, Disposition::Failed);
            info!(
                "done: {saved} saved, {skipped} skipped, {failed} failed; report written to {}",
                cli.report.display()
            );
            Ok(())
        }
        Err(RunError::Cancelled) => anyhow::bail!("run cancelled before completion"),
        Err(err) => Err(err).context("run failed"),
    }
}

fn count(rows: &[docfetch_engine::OutcomeRow], disposition: Disposition) -> usize {
    rows.iter().filter(|r| r.disposition == disposition).count()
}
