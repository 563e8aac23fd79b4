//! Tracing subscriber setup for hosts that don't install their own.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the filter directive, e.g. `pyoutlier_py=debug`.
pub const LOG_ENV: &str = "PYOUTLIER_LOG";

const DEFAULT_FILTER: &str = "warn";

/// Install a global fmt subscriber filtered by `PYOUTLIER_LOG`.
///
/// Returns `false` when a global subscriber was already set; safe to call
/// more than once.
pub fn init_tracing() -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_is_idempotent() {
        init_tracing();
        assert!(!init_tracing());
    }
}
