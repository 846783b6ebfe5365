use anyhow::{Context, Result};
use std::path::Path;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "study_timer=info";

/// Install the global tracing subscriber.
///
/// With a log file, everything goes there without colour. Otherwise logs go to
/// stderr when `to_stderr` is set and are dropped when it is not (the TUI owns
/// the terminal).
pub fn init(log_file: Option<&Path>, to_stderr: bool) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let res = if let Some(path) = log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("open log file {}", path.display()))?;
        builder
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .try_init()
    } else if to_stderr {
        builder.with_writer(std::io::stderr).try_init()
    } else {
        return Ok(());
    };
    res.map_err(|e| anyhow::anyhow!("install tracing subscriber: {e}"))
}
