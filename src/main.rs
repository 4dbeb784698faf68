mod app;
mod cache;
mod commands;
mod config;
mod event;
mod snapshot;
mod stopwatch;
mod ui;

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "watchdeck")]
#[command(about = "A terminal dashboard of stopwatches")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/watchdeck/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Number of stopwatches on the dashboard
  #[arg(short, long)]
  stopwatches: Option<usize>,
}

/// Log to a file in the data directory; the terminal belongs to the UI.
/// The returned guard must live until exit so buffered lines flush.
fn init_logging() -> Result<tracing_appender::non_blocking::WorkerGuard> {
  let log_dir = dirs::data_dir()
    .map(|d| d.join("watchdeck").join("logs"))
    .unwrap_or_else(|| PathBuf::from("."));
  std::fs::create_dir_all(&log_dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", log_dir.display(), e))?;

  let appender = tracing_appender::rolling::daily(log_dir, "watchdeck.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_env("WATCHDECK_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
    )
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _log_guard = init_logging()?;

  // Load configuration
  let config = config::Config::load(args.config.as_deref())?;

  // Override the widget count if specified on the command line
  let config = if let Some(n) = args.stopwatches {
    config::Config {
      stopwatches: n.max(1),
      ..config
    }
  } else {
    config
  };

  // Initialize and run the app
  let mut app = app::App::new(config)?;
  app.run().await?;

  Ok(())
}
