use anyhow::Result;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the logging system
/// Logs are written to the logs/ directory only (no console output)
pub fn init_logging(verbose: bool) -> Result<()> {
    std::fs::create_dir_all("logs")?;

    // Daily rotation in the logs/ folder
    let file_appender = RollingFileAppender::new(Rotation::DAILY, "logs", "sourdough.log");

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true);

    // RUST_LOG overrides the level implied by the verbose flag
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    tracing::info!("Logging system initialized");
    tracing::info!("Log files location: logs/sourdough.log");

    Ok(())
}
