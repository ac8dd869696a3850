//! Structured logging setup.

use tracing_subscriber::EnvFilter;

/// Filter used when neither `RUST_LOG` nor the config names one.
pub const DEFAULT_FILTER: &str = "roster_search=info";

/// Pick the filter directive: `RUST_LOG` wins, then the configured filter,
/// then [`DEFAULT_FILTER`].
pub fn resolve_filter(env_value: Option<&str>, configured: Option<&str>) -> String {
    [env_value, configured]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or(DEFAULT_FILTER)
        .to_string()
}

/// Initialize structured logging to stderr.
///
/// Call once at program startup; later calls are ignored.
pub fn init_logging(configured: Option<&str>) {
    let env_value = std::env::var("RUST_LOG").ok();
    let directive = resolve_filter(env_value.as_deref(), configured);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|e| {
        eprintln!("invalid log filter {directive:?}: {e}; using {DEFAULT_FILTER}");
        EnvFilter::new(DEFAULT_FILTER)
    });

    // try_init so double-init in tests doesn't panic
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}
