//! Sitemapper CLI Library
//!
//! Command implementations for the Sitemapper binary, exposed as a library
//! for documentation and integration purposes.
//!
//! # Modules
//!
//! - [`cmd`] - Command implementations (build, check)
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use sitemapper::cmd;
//!
//! # async fn run() -> color_eyre::eyre::Result<()> {
//! let options = cmd::build::BuildOptions {
//!     data: Path::new(".cache/site-data.json").to_path_buf(),
//!     output: None,
//!     path_prefix: None,
//! };
//! cmd::build::run(Path::new("sitemap.toml"), options).await?;
//! # Ok(())
//! # }
//! ```

pub mod cmd;

// Re-export core types for convenience
pub use sitemapper_core::{Config, SitemapConfig};
pub use sitemapper_generator::{PostBuild, PostBuildReport, SnapshotExecutor};

/// Initialize tracing with the specified verbosity level.
///
/// # Arguments
///
/// * `verbose` - Verbosity level (0 = WARN, 1 = INFO, 2 = DEBUG, 3+ = TRACE)
///
/// # Example
///
/// ```no_run
/// sitemapper::init_tracing(2); // Enable DEBUG level logging
/// ```
pub fn init_tracing(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}
