use std::sync::OnceLock;

use tracing_subscriber::{fmt as tracing_fmt, EnvFilter};

static INIT: OnceLock<()> = OnceLock::new();

/// Installs a stderr subscriber filtered by `filter`, e.g. `"info"` or
/// `"rs_array_literal::vector=debug"`. `RUST_LOG` takes precedence when set.
///
/// Only the first call has an effect. An already installed global subscriber is kept.
pub fn init_logging(filter: &str) {
    INIT.get_or_init(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
        let _ = tracing_fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .try_init();
    });
}

pub fn init() {
    init_logging("info");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_logging("debug");
        init_logging("trace");
        init();
        tracing::debug!("logging initialized");
        assert!(INIT.get().is_some());
    }
}
