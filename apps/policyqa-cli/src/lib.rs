//! Process setup shared by the binaries.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use policyqa_core::config::{Config, Settings};

/// Reads `.env` if present and installs the `RUST_LOG`-driven subscriber
/// (default `info`). Logs go to stderr so answers on stdout stay clean.
pub fn init() {
    dotenv::dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).compact().init();
}

pub fn load_settings() -> Result<Settings> {
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {e}");
        e
    })?;
    config.settings()
}
