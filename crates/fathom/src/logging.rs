//! Log output for test runs.
//!
//! Fathom emits `tracing` events for retried attempts, final failures and
//! swallowed listener errors. Call [`init`] once, e.g. at the start of a
//! test binary, to print them.

use tracing_subscriber::EnvFilter;

/// Variable holding the filter directive, e.g. `fathom=debug`
pub const LOG_VAR: &str = "FATHOM_LOG";

/// Directive used when neither `FATHOM_LOG` nor `RUST_LOG` is set
pub const DEFAULT_DIRECTIVE: &str = "warn";

/// Install a formatting subscriber filtered by `FATHOM_LOG`, falling back to
/// `RUST_LOG` and then to `warn`.
///
/// Does nothing if a global subscriber is already installed, so it is safe
/// to call from every test.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_test_writer()
        .try_init();
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_VAR)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init();
        init();
        tracing::debug!("logged after init");
    }

    #[test]
    fn test_filter_builds() {
        let directive = filter().to_string();
        assert!(!directive.is_empty());
    }
}
