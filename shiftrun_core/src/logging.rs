//! Tracing setup for the shiftrun binary and tests.
//!
//! Logs always go to stderr so the plan table on stdout stays clean.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Filter used when RUST_LOG is unset
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        // Per-day scheduling decisions from the engine and enforcement pass
        "warn,shiftrun_core=debug,shiftrun=debug"
    } else {
        "warn"
    }
}

/// Install the global subscriber. RUST_LOG takes precedence over `verbose`.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let layer = fmt::layer()
        .compact()
        .with_target(verbose)
        .without_time()
        .with_writer(std::io::stderr);

    // A second init (e.g. from an embedding host) keeps the first subscriber
    if tracing_subscriber::registry().with(filter).with(layer).try_init().is_err() {
        tracing::debug!("Global subscriber already installed");
    }
}

/// Capture debug output in test runs
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("shiftrun_core=debug"))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_levels() {
        assert_eq!(default_directive(false), "warn");
        assert!(default_directive(true).contains("shiftrun_core=debug"));
        assert!(EnvFilter::try_new(default_directive(true)).is_ok());
    }
}
