//! Tracing setup for binaries and tests.

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Install a hierarchical tracing subscriber filtered by `RUST_LOG`.
///
/// Safe to call more than once; only the first call does anything, and
/// nothing is installed unless `RUST_LOG` is set. Enable with e.g.
/// `RUST_LOG=regal_safety=debug`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            let tree = tracing_tree::HierarchicalLayer::new(2)
                .with_targets(true)
                .with_bracketed_fields(true);
            // Another subscriber may already be installed by the host.
            let _ = tracing_subscriber::registry().with(filter).with(tree).try_init();
        }
    });
}
