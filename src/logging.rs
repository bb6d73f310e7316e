//! Process-wide logging setup.
//!
//! Detectors only emit `tracing` events; installing a subscriber is left to
//! the program entry point through [`init`].

use std::sync::OnceLock;

use tracing_subscriber::{fmt, EnvFilter};

static INIT: OnceLock<bool> = OnceLock::new();

/// Install a formatted subscriber filtered by `RUST_LOG` (default `info`).
///
/// Safe to call any number of times; only the first call has an effect.
/// Returns `false` when another global subscriber was already installed.
pub fn init() -> bool {
    *INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        fmt().with_env_filter(filter).with_target(true).try_init().is_ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let first = init();
        assert_eq!(init(), first);
        assert_eq!(init(), first);
    }
}
