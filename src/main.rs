mod run;

use std::path::PathBuf;

use activity_core::client::RestStreamClient;
use activity_core::config::AppConfig;
use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "stream-activity",
    about = "Report per-user sent/read activity in a chat stream",
    version,
    author
)]
struct Cli {
    /// Path to the platform credentials/config TOML file
    #[arg(long)]
    config: PathBuf,

    /// Conversation ID of the stream being monitored
    #[arg(long)]
    stream: String,

    /// Report messages sent since this epoch timestamp, seconds or
    /// milliseconds (default: 7 days ago)
    #[arg(long)]
    since: Option<String>,

    /// Where to write the report
    #[arg(long, default_value = "results.txt")]
    output: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up tracing.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "stream_activity=info,warn".into()),
        )
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let since_ms = match &cli.since {
        Some(raw) => run::parse_since(raw)?,
        None => (Utc::now().timestamp() - 7 * 24 * 60 * 60) * 1000,
    };

    // Bad or missing credentials abort before any platform call.
    let config = AppConfig::load_from(&cli.config)?;
    let client = RestStreamClient::new(&config.platform)?;

    let options = run::RunOptions {
        stream_id: cli.stream,
        since_ms,
    };
    let report = run::collect_report(&client, &options).await?;

    std::fs::write(&cli.output, &report)?;
    tracing::info!("wrote report to {}", cli.output.display());

    Ok(())
}
