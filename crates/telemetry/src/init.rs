// Path: crates/telemetry/src/init.rs
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_DIRECTIVE: &str = "info";

fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Initializes the global `tracing` subscriber for structured JSON logging on stderr.
///
/// Records emitted through the `log` facade (the governance tally reports) are bridged
/// into `tracing`.
pub fn init_tracing() -> Result<(), anyhow::Error> {
    init_tracing_with(DEFAULT_DIRECTIVE)
}

/// Like [`init_tracing`], with an explicit fallback filter such as
/// `"info,slashing=debug"`.
pub fn init_tracing_with(default_directive: &str) -> Result<(), anyhow::Error> {
    let fmt_layer = fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_timer(fmt::time::UtcTime::rfc_3339());
    let subscriber = Registry::default()
        .with(env_filter(default_directive))
        .with(fmt_layer);
    tracing_log::LogTracer::init()?;
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Installs a human-readable subscriber writing through the test harness's capture.
/// Safe to call from every test; only the first call takes effect.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter("debug"))
        .with_test_writer()
        .try_init();
}
