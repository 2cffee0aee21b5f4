//! Opt-in log output for hosts and tests.
//!
//! Program output goes through the print handler, usually to stdout, so logs
//! are written to stderr and never interleave with what the program prints.

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Install an stderr `fmt` subscriber filtered by `RUST_LOG`.
///
/// Does nothing unless `RUST_LOG` is set, or when the host already installed
/// a global subscriber. Safe to call more than once.
///
/// Useful filters: `pyr_eval=debug` shows nested runs, chaining and jumps
/// across guarded blocks; `pyr_eval=trace` adds every dispatched Step.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var_os("RUST_LOG").is_none() {
            return;
        }
        let installed = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true),
            )
            .with(EnvFilter::from_default_env())
            .try_init();
        if installed.is_err() {
            tracing::debug!("global subscriber already installed");
        }
    });
}
