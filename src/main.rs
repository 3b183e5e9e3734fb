//! tagstat - Count Stack Exchange questions per tag by date

use chrono::Utc;
use clap::Parser;
use std::sync::Arc;
use tagstat::{
    aggregation::Aggregator,
    cli::Cli,
    error::Result,
    output::{RunSummary, get_formatter, write_counts},
};
use tagstat_client::StackExchangeClient;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // --quiet and --verbose override RUST_LOG. Logs go to stderr so stdout
    // only carries the summary.
    let filter = if cli.quiet || cli.verbose {
        tracing_subscriber::EnvFilter::new(cli.log_directive())
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.log_directive()))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let quiet = cli.quiet;
    let config = cli.into_config(Utc::now())?;

    let stdout_is_terminal = is_terminal::is_terminal(std::io::stdout());
    let show_progress = !config.json && !quiet && stdout_is_terminal;
    let color = !config.json && stdout_is_terminal && std::env::var_os("NO_COLOR").is_none();

    info!(
        "Collecting {} tag(s) | period_utc: {} | grain={}",
        config.tags.len(),
        config.window,
        config.granularity
    );

    let client = Arc::new(StackExchangeClient::new(&config.api_url, config.timeout)?);
    let aggregator = Aggregator::new(client, config.window, config.fetch.clone())
        .with_granularity(config.granularity)
        .with_strict(config.strict)
        .with_progress(show_progress);

    let formatter = get_formatter(config.json, color);
    let collection = aggregator
        .collect(&config.tags, |report| {
            if let Some(line) = formatter.format_tag(report) {
                println!("{line}");
            }
        })
        .await?;

    let rows = write_counts(&config.output, &collection.table)?;

    let failed = collection.failed_tags();
    if failed > 0 {
        warn!("{} of {} tag(s) stopped early", failed, config.tags.len());
    }

    let summary = RunSummary {
        window: &config.window,
        granularity: config.granularity,
        reports: &collection.reports,
        output: &config.output,
        rows,
    };
    println!("{}", formatter.format_run(&summary));

    Ok(())
}
