//! Post-build orchestration.
//!
//! Runs the queries, aggregates records into buckets, renders the sitemaps
//! and writes them next to the built site.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};

use rayon::prelude::*;
use sitemapper_core::{CoreError, SitemapConfig};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::{
    aggregate::{AggregateError, AggregationContext, aggregate},
    manager::{SitemapManager, SitemapOptions},
    query::{DEFAULT_QUERY, QueryData, QueryError, QueryExecutor, run_query},
    stylesheet,
};

/// Build errors.
#[derive(Debug, Error)]
pub enum BuildError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Query error.
    #[error("query error: {0}")]
    Query(#[from] QueryError),

    /// Aggregation error.
    #[error("aggregation error: {0}")]
    Aggregate(#[from] AggregateError),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] CoreError),

    /// The stylesheet template could not be read.
    #[error("cannot read stylesheet template {path}: {source}")]
    Stylesheet {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// A file that could not be written.
#[derive(Debug)]
pub struct WriteFailure {
    pub path: PathBuf,
    pub error: std::io::Error,
}

/// Per-sitemap statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapStats {
    /// Display name.
    pub name: String,

    /// Bucket rendered into the file.
    pub bucket: String,

    /// Number of URLs in the file.
    pub urls: usize,

    /// Output file.
    pub path: PathBuf,
}

/// Outcome of a post-build run.
#[derive(Debug, Default)]
pub struct PostBuildReport {
    /// One entry per resource sitemap, in index order.
    pub sitemaps: Vec<SitemapStats>,

    /// Files written successfully.
    pub written: Vec<PathBuf>,

    /// Files that failed to write.
    pub failures: Vec<WriteFailure>,

    /// Run duration in milliseconds.
    pub duration_ms: u64,
}

impl PostBuildReport {
    /// Whether every file was written.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Total URLs across all sitemaps.
    pub fn total_urls(&self) -> usize {
        self.sitemaps.iter().map(|s| s.urls).sum()
    }
}

/// Post-build sitemap step.
#[derive(Debug)]
pub struct PostBuild {
    config: SitemapConfig,
    output_dir: PathBuf,
}

impl PostBuild {
    /// Create the step; files go to `config.output_dir`.
    #[must_use]
    pub fn new(config: SitemapConfig) -> Self {
        let output_dir = PathBuf::from(&config.output_dir);
        Self { config, output_dir }
    }

    /// Override the output directory.
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Execute the full run.
    ///
    /// Query, configuration and aggregation errors abort the run. Write
    /// failures do not: they are logged and returned in the report.
    pub fn run(&self, executor: &dyn QueryExecutor) -> Result<PostBuildReport> {
        let start = Instant::now();

        info!(output = %self.output_dir.display(), "generating sitemaps");

        // 1. Built pages and site URL
        let defaults = run_query(executor, DEFAULT_QUERY)?;
        let ctx = AggregationContext::from_query_data(&defaults, &self.config)?;

        // 2. Content sources
        let sources = match self.config.query.as_deref() {
            Some(query) if self.config.runs_custom_query() => run_query(executor, query)?,
            _ => QueryData::new(),
        };

        // 3. Aggregate
        let mapping = self.config.effective_mapping();
        let buckets = aggregate(&sources, &ctx, &mapping)?;

        // 4. Feed the manager
        let options = SitemapOptions::new(ctx.site_url().clone(), self.config.sitemap_types()?);
        let mut manager = SitemapManager::new();
        for bucket in buckets.values() {
            for entry in &bucket.entries {
                manager.add_url(&bucket.name, entry);
            }
        }

        // 5. Render
        let template = stylesheet::load_template(self.config.stylesheet.as_deref()).map_err(
            |source| BuildError::Stylesheet {
                path: self.config.stylesheet.clone().unwrap_or_default(),
                source,
            },
        )?;

        let mut files = vec![
            (
                self.output_path(&options.stylesheet_output),
                stylesheet::render(&template, &options.index_url()),
            ),
            (
                self.output_path(&options.index_output),
                manager.index_xml(&options),
            ),
        ];

        let mut report = PostBuildReport::default();
        for source in &options.sources {
            let path = self.output_path(&options.resource_path(&source.name));
            files.push((path.clone(), manager.sitemap_xml(&source.bucket, &options)));
            report.sitemaps.push(SitemapStats {
                name: source.name.clone(),
                bucket: source.bucket.clone(),
                urls: manager.url_count(&source.bucket),
                path,
            });
        }

        // 6. Write
        fs::create_dir_all(&self.output_dir)?;
        let (written, failures) = write_files(files);
        report.written = written;
        report.failures = failures;
        report.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            sitemaps = report.sitemaps.len(),
            urls = report.total_urls(),
            written = report.written.len(),
            failed = report.failures.len(),
            duration_ms = report.duration_ms,
            "sitemaps generated"
        );

        Ok(report)
    }

    /// Map a site path like `/sitemap.xml` into the output directory.
    fn output_path(&self, site_path: &str) -> PathBuf {
        self.output_dir.join(site_path.trim_start_matches('/'))
    }
}

/// Write every file in parallel. Each write succeeds or fails on its own;
/// results keep the input order.
fn write_files(files: Vec<(PathBuf, String)>) -> (Vec<PathBuf>, Vec<WriteFailure>) {
    let results: Vec<_> = files
        .into_par_iter()
        .map(|(path, content)| match fs::write(&path, content) {
            Ok(()) => {
                debug!(path = %path.display(), "wrote sitemap file");
                Ok(path)
            }
            Err(error) => {
                error!(path = %path.display(), %error, "failed to write sitemap file");
                Err(WriteFailure { path, error })
            }
        })
        .collect();

    let mut written = Vec::new();
    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok(path) => written.push(path),
            Err(failure) => failures.push(failure),
        }
    }

    (written, failures)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use sitemapper_core::MappingEntry;
    use tempfile::TempDir;

    use super::*;
    use crate::query::{QueryResponse, SnapshotExecutor};

    fn snapshot() -> SnapshotExecutor {
        SnapshotExecutor::new(
            json!({
                "site": { "siteMetadata": { "siteUrl": "https://example.com" } },
                "allSitePage": { "edges": [
                    { "node": { "id": "1", "slug": "/", "url": "/" } },
                    { "node": { "id": "2", "slug": "/about/", "url": "/about/" } },
                    { "node": { "id": "3", "slug": "/2024/hello/", "url": "/2024/hello/" } },
                    { "node": { "id": "4", "slug": "/404/", "url": "/404/" } }
                ] },
                "allMarkdownRemark": { "edges": [
                    { "node": {
                        "fields": { "slug": "/hello/" },
                        "frontmatter": { "published_at": "2024-02-03T04:05:06Z" }
                    } }
                ] }
            })
            .as_object()
            .unwrap()
            .clone(),
        )
    }

    fn posts_config(output: &Path) -> SitemapConfig {
        SitemapConfig {
            query: Some("{ allMarkdownRemark { edges { node { id } } } }".to_string()),
            mapping: vec![MappingEntry::new("allMarkdownRemark", "posts")],
            output_dir: output.to_string_lossy().to_string(),
            ..SitemapConfig::default()
        }
    }

    #[test]
    fn test_default_run_puts_everything_in_pages() {
        let output_dir = TempDir::new().unwrap();
        let config = SitemapConfig::default();

        let report = PostBuild::new(config)
            .with_output_dir(output_dir.path())
            .run(&snapshot())
            .unwrap();

        assert!(report.is_complete());
        assert_eq!(report.sitemaps.len(), 1);
        assert_eq!(report.sitemaps[0].name, "pages");
        assert_eq!(report.sitemaps[0].urls, 3);
        assert!(output_dir.path().join("sitemap.xml").exists());
        assert!(output_dir.path().join("sitemap-pages.xml").exists());
        assert!(output_dir.path().join("sitemap.xsl").exists());
        assert_eq!(report.written.len(), 3);
    }

    #[test]
    fn test_posts_mapping_run() {
        let output_dir = TempDir::new().unwrap();

        let report = PostBuild::new(posts_config(output_dir.path()))
            .run(&snapshot())
            .unwrap();

        let names: Vec<_> = report.sitemaps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["posts", "pages"]);
        assert_eq!(report.total_urls(), 3);

        let posts = fs::read_to_string(output_dir.path().join("sitemap-posts.xml")).unwrap();
        assert!(posts.contains("<loc>https://example.com/2024/hello/</loc>"));
        assert!(posts.contains("<lastmod>2024-02-03T04:05:06Z</lastmod>"));

        let pages = fs::read_to_string(output_dir.path().join("sitemap-pages.xml")).unwrap();
        assert!(pages.contains("<loc>https://example.com/about/</loc>"));
        assert!(!pages.contains("/2024/hello/"));
        assert!(!pages.contains("/404/"));

        let index = fs::read_to_string(output_dir.path().join("sitemap.xml")).unwrap();
        assert!(index.contains("https://example.com/sitemap-posts.xml"));
        assert!(index.contains("https://example.com/sitemap-pages.xml"));

        let xsl = fs::read_to_string(output_dir.path().join("sitemap.xsl")).unwrap();
        assert!(xsl.contains("https://example.com/sitemap.xml"));
        assert!(!xsl.contains("{{blog-url}}"));
    }

    #[test]
    fn test_query_errors_abort() {
        let output_dir = TempDir::new().unwrap();
        let executor = |_: &str| QueryResponse::failed(vec!["syntax error".to_string()]);

        let err = PostBuild::new(SitemapConfig::default())
            .with_output_dir(output_dir.path())
            .run(&executor)
            .unwrap_err();

        assert!(matches!(err, BuildError::Query(_)));
        assert!(!output_dir.path().join("sitemap.xml").exists());
    }

    #[test]
    fn test_missing_site_url_aborts() {
        let output_dir = TempDir::new().unwrap();
        let executor = SnapshotExecutor::new(
            json!({ "site": null, "allSitePage": { "edges": [] } })
                .as_object()
                .unwrap()
                .clone(),
        );

        let err = PostBuild::new(SitemapConfig::default())
            .with_output_dir(output_dir.path())
            .run(&executor)
            .unwrap_err();

        assert!(err.to_string().contains("site URL"));
    }

    #[test]
    fn test_missing_stylesheet_template() {
        let output_dir = TempDir::new().unwrap();
        let config = SitemapConfig {
            stylesheet: Some(output_dir.path().join("nope.xsl")),
            ..SitemapConfig::default()
        };

        let err = PostBuild::new(config)
            .with_output_dir(output_dir.path())
            .run(&snapshot())
            .unwrap_err();

        assert!(matches!(err, BuildError::Stylesheet { .. }));
    }

    #[test]
    fn test_write_failures_are_reported() {
        let output_dir = TempDir::new().unwrap();
        // A directory where the index file should go makes that write fail.
        fs::create_dir(output_dir.path().join("sitemap.xml")).unwrap();

        let report = PostBuild::new(SitemapConfig::default())
            .with_output_dir(output_dir.path())
            .run(&snapshot())
            .unwrap();

        assert!(!report.is_complete());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, output_dir.path().join("sitemap.xml"));
        assert_eq!(report.written.len(), 2);
    }

    #[test]
    fn test_post_build_report_default() {
        let report = PostBuildReport::default();
        assert!(report.is_complete());
        assert_eq!(report.total_urls(), 0);
        assert_eq!(report.duration_ms, 0);
    }
}
