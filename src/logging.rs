//! Logging setup for binaries and demos

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "agentweave=info";

/// Install a `fmt` subscriber filtered by `RUST_LOG`, defaulting to [`DEFAULT_FILTER`]
///
/// Returns `false` when a global subscriber was already installed.
pub fn init_logging() -> bool {
    init_logging_with(DEFAULT_FILTER)
}

pub fn init_logging_with(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).try_init().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_harmless() {
        init_logging();
        assert!(!init_logging());
    }
}
