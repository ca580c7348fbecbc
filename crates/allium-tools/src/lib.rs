//! Allium Tools
//!
//! CLI tools for working with Allium specifications.

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize logging with a default filter.
///
/// Use `RUST_LOG` environment variable to override the default filter.
/// Default is `info` for the checker crates and `warn` for others.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,allium_tools=info,allium_lang=info"));

    fmt().with_env_filter(filter).with_target(false).init();
}
