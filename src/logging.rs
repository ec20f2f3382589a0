use std::{fs::OpenOptions, path::PathBuf};

use color_eyre::eyre::Result;
use tracing::error;
use tracing_error::ErrorLayer;
use tracing_subscriber::{self, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use demo_wallet::config::get_data_dir;

const LOG_FILE: &str = "demo-wallet.log";

/// Default filter, extended by `RUST_LOG`.
const LOG_DIRECTIVE: &str = "demo_wallet=debug";

pub fn log_file_path() -> PathBuf {
    get_data_dir().join(LOG_FILE)
}

/// Send all tracing output to the log file. The terminal belongs to the UI.
pub fn init() -> Result<()> {
    std::fs::create_dir_all(get_data_dir())?;

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path())?;

    let file_subscriber = tracing_subscriber::fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_filter(EnvFilter::from_default_env().add_directive(LOG_DIRECTIVE.parse()?));

    tracing_subscriber::registry()
        .with(file_subscriber)
        .with(ErrorLayer::default())
        .init();

    Ok(())
}

/// Log a panic message and its location.
pub fn log_panic(panic: &std::panic::PanicHookInfo) {
    let msg = panic
        .payload()
        .downcast_ref::<&'static str>()
        .copied()
        .or_else(|| panic.payload().downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic payload");

    let location = panic.location().map_or_else(
        || "unknown location".to_string(),
        |loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()),
    );

    error!("Panic occurred: {} at {}", msg, location);
}
