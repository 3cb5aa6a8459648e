//! Sitemapper Core Library
//!
//! Configuration, data model and error handling for the Sitemapper
//! post-build sitemap generator.

pub mod config;
pub mod error;
pub mod mapping;
pub mod record;

pub use config::{Config, SitemapConfig};
pub use error::{CoreError, Result};
pub use mapping::{ChangeFreq, DEFAULT_BUCKET, MappingEntry, PAGES_SOURCE, SitemapType};
pub use record::{BuiltPage, ContentRecord, Metadata, SitemapBucket, SitemapEntry, SourceKind};
