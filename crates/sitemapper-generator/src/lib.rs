//! Sitemapper Generator Library
//!
//! Post-build sitemap generation for static sites.
//!
//! # Modules
//!
//! - [`query`] - Query execution against the site's data layer
//! - [`exclude`] - Path exclusion filter
//! - [`normalize`] - Record normalization per source shape
//! - [`resolve`] - Output path resolution against built pages
//! - [`aggregate`] - Bucketing and built page reconciliation
//! - [`manager`] - Sitemap and sitemap index XML generation
//! - [`stylesheet`] - XSLT stylesheet templating
//! - [`build`] - Post-build orchestration

pub mod aggregate;
pub mod build;
pub mod exclude;
pub mod manager;
pub mod normalize;
pub mod query;
pub mod resolve;
pub mod stylesheet;

pub use aggregate::{AggregationContext, Buckets, aggregate};
pub use build::{BuildError, PostBuild, PostBuildReport, SitemapStats, WriteFailure};
pub use exclude::ExclusionFilter;
pub use manager::{SitemapManager, SitemapOptions};
pub use normalize::{RawRecord, normalize};
pub use query::{QueryExecutor, QueryResponse, SnapshotExecutor};
pub use resolve::{join_path, resolve};
