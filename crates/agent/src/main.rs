//! `pinwatch-agent` -- GPIO alarm monitor daemon.
//!
//! Polls the configured input lines and, when every line leaves its
//! resting level at once, posts an alert to the configured HTTP API with
//! bounded retries. Polling continues while alerts are in flight.
//!
//! # Environment variables
//!
//! | Variable             | Required | Default       | Description                              |
//! |----------------------|----------|---------------|------------------------------------------|
//! | `PINWATCH_CONFIG`    | no       | `config.json` | Path to the JSON configuration file      |
//! | `PINWATCH_LOG_DIR`   | no       | --            | Also write daily-rotated JSON logs here  |
//! | `POLL_INTERVAL_MS`   | no       | from config   | Poll cadence override (10..=500 ms)      |
//! | `PINWATCH_GPIO_CHIP` | no       | from config   | GPIO chip name or device path            |
//! | `RUST_LOG`           | no       | `pinwatch_agent=info,pinwatch_dispatch=info` | Log filter |

use std::path::PathBuf;
use std::sync::Arc;

use pinwatch_agent::config;
use pinwatch_agent::logging;
use pinwatch_agent::monitor::MonitorLoop;
use pinwatch_agent::pins::CdevPins;
use pinwatch_core::PinSource;
use pinwatch_dispatch::{AlertDispatcher, AlertTransport, HttpTransport};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let log_dir = std::env::var_os("PINWATCH_LOG_DIR").map(PathBuf::from);
    let _log_guard = logging::init(log_dir.as_deref()).unwrap_or_else(|e| {
        eprintln!("Failed to set up logging: {e}");
        std::process::exit(1);
    });

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "pinwatch-agent started");

    let (path, config) = config::load_from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration, refusing to start");
        std::process::exit(1);
    });

    tracing::info!(
        path = %path.display(),
        config = %config.aggregate.summary(),
        poll_interval_ms = config.poll_interval.as_millis() as u64,
        retry_delay_secs = config.retry_delay.as_secs(),
        request_timeout_secs = config.request_timeout.as_secs(),
        gpio_chip = %config.gpio_chip.display(),
        "Configuration loaded",
    );

    let pins = Arc::new(CdevPins::new(config.gpio_chip.clone()));
    if let Err(e) = pins.prepare(config.aggregate.lines(), config.aggregate.pull_mode()) {
        tracing::error!(error = %e, "Failed to set up GPIO lines");
        std::process::exit(1);
    }

    let transport: Arc<dyn AlertTransport> = Arc::new(HttpTransport::new(config.request_timeout));
    let dispatcher = Arc::new(
        AlertDispatcher::new(Arc::clone(&config.aggregate), transport)
            .with_retry_delay(config.retry_delay),
    );

    let monitor = MonitorLoop::new(config.aggregate, pins, dispatcher, config.poll_interval);

    tokio::select! {
        _ = monitor.run() => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received, stopping monitor");
        }
    }
}
