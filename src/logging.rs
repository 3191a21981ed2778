//! Logging setup for the binary.
//!
//! The library only emits `tracing` events; this installs a stderr
//! subscriber so stdout stays reserved for formatter output.

use tracing_subscriber::EnvFilter;

/// Environment variable holding an `EnvFilter` directive.
pub const LOG_ENV: &str = "NODESEL_LOG";

const DEFAULT_FILTER: &str = "warn";

/// `--debug` wins, then `NODESEL_LOG`, then `warn`.
fn filter_directive(debug: bool, env: Option<String>) -> String {
    if debug {
        return "debug".to_string();
    }
    env.filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

fn build_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_new(directive).unwrap_or_else(|e| {
        eprintln!("warning: ignoring invalid {LOG_ENV} value `{directive}`: {e}");
        EnvFilter::new(DEFAULT_FILTER)
    })
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init_logging(debug: bool) {
    let directive = filter_directive(debug, std::env::var(LOG_ENV).ok());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(build_filter(&directive))
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    // The first subscriber wins (tests may install one first).
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_flag_wins() {
        assert_eq!(filter_directive(true, Some("error".into())), "debug");
    }

    #[test]
    fn env_then_default() {
        assert_eq!(filter_directive(false, Some("nodesel=trace".into())), "nodesel=trace");
        assert_eq!(filter_directive(false, Some("  ".into())), "warn");
        assert_eq!(filter_directive(false, None), "warn");
    }

    #[test]
    fn invalid_directive_falls_back() {
        assert_eq!(build_filter("nodesel=loud").to_string(), "warn");
        assert_eq!(build_filter("debug").to_string(), "debug");
    }

    #[test]
    fn init_logging_is_idempotent() {
        init_logging(false);
        init_logging(true);
    }
}
