//! Record aggregation.
//!
//! Runs every mapped source through exclusion, normalization and path
//! resolution, buckets the results by sitemap, then reconciles against the
//! built page list so no page is left out.

use std::collections::{BTreeMap, HashSet};

use serde_json::Value;
use sitemapper_core::{
    BuiltPage, ContentRecord, CoreError, DEFAULT_BUCKET, MappingEntry, PAGES_SOURCE,
    SitemapBucket, SitemapConfig, SitemapEntry, mapping::sitemap_types,
};
use thiserror::Error;
use tracing::{debug, info, trace};
use url::Url;

use crate::{
    exclude::ExclusionFilter,
    normalize::{NormalizeError, RawRecord, normalize},
    query::QueryData,
    resolve::resolve,
};

/// Aggregation errors.
#[derive(Debug, Error)]
pub enum AggregateError {
    /// A record could not be normalized.
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    /// Missing site URL or invalid mapping.
    #[error(transparent)]
    Config(#[from] CoreError),

    /// Query data does not have the expected shape.
    #[error("malformed `{source_name}` data: {message}")]
    Data {
        source_name: String,
        message: String,
    },

    /// A path could not be joined onto the site URL.
    #[error("cannot build URL for `{path}`: {source}")]
    Url {
        path: String,
        #[source]
        source: url::ParseError,
    },
}

/// Result type for aggregation.
pub type Result<T> = std::result::Result<T, AggregateError>;

/// Buckets keyed by name.
pub type Buckets = BTreeMap<String, SitemapBucket>;

/// Everything the pipeline stages need besides the records themselves.
#[derive(Debug, Clone)]
pub struct AggregationContext {
    site_url: Url,
    path_prefix: String,
    exclusion: ExclusionFilter,
    built_pages: Vec<BuiltPage>,
    add_uncaught_pages: bool,
}

impl AggregationContext {
    /// Create a context for `site_url`. Built pages are taken as given.
    pub fn new(site_url: &str, config: &SitemapConfig, built_pages: Vec<BuiltPage>) -> Result<Self> {
        if site_url.trim().is_empty() {
            return Err(CoreError::config("site URL is missing from the site metadata").into());
        }

        let site_url = Url::parse(site_url).map_err(|e| {
            CoreError::config_with_source(format!("site URL `{site_url}` is invalid"), e)
        })?;

        Ok(Self {
            site_url,
            path_prefix: config.path_prefix.clone(),
            exclusion: ExclusionFilter::new(&config.exclude),
            built_pages,
            add_uncaught_pages: config.add_uncaught_pages,
        })
    }

    /// Build the context from the default query's result: the site URL from
    /// `site.siteMetadata.siteUrl` and the built pages from `allSitePage`,
    /// minus excluded ones.
    pub fn from_query_data(data: &QueryData, config: &SitemapConfig) -> Result<Self> {
        let site_url = data
            .get("site")
            .and_then(|site| site.get("siteMetadata"))
            .and_then(|meta| meta.get("siteUrl"))
            .and_then(Value::as_str)
            .unwrap_or_default();

        let mut ctx = Self::new(site_url, config, Vec::new())?;

        if let Some(pages) = data.get(PAGES_SOURCE) {
            for node in edge_nodes(PAGES_SOURCE, pages)? {
                let Some(page) = built_page(node)? else {
                    continue;
                };
                let slug = node.get("slug").and_then(Value::as_str).unwrap_or(&page.path);
                if ctx.exclusion.is_included(slug) {
                    ctx.built_pages.push(page);
                } else {
                    trace!(path = %page.path, "excluded built page");
                }
            }
        }

        debug!(
            site_url = %ctx.site_url,
            built_pages = ctx.built_pages.len(),
            "aggregation context ready"
        );
        Ok(ctx)
    }

    pub fn site_url(&self) -> &Url {
        &self.site_url
    }

    pub fn built_pages(&self) -> &[BuiltPage] {
        &self.built_pages
    }

    pub fn exclusion(&self) -> &ExclusionFilter {
        &self.exclusion
    }

    /// Resolve `path` against the site URL.
    pub fn absolute_url(&self, path: &str) -> Result<String> {
        self.site_url
            .join(path)
            .map(String::from)
            .map_err(|source| AggregateError::Url {
                path: path.to_string(),
                source,
            })
    }
}

/// Nodes of a source's `edges` list. Null sources have no nodes; null edges
/// and null nodes are skipped.
fn edge_nodes<'a>(source: &str, value: &'a Value) -> Result<Vec<&'a Value>> {
    if value.is_null() {
        return Ok(Vec::new());
    }

    let edges = value
        .get("edges")
        .and_then(Value::as_array)
        .ok_or_else(|| AggregateError::Data {
            source_name: source.to_string(),
            message: "expected an `edges` list".to_string(),
        })?;

    Ok(edges
        .iter()
        .filter_map(|edge| edge.get("node"))
        .filter(|node| !node.is_null())
        .collect())
}

/// Read a built page from an `allSitePage` node.
fn built_page(node: &Value) -> Result<Option<BuiltPage>> {
    if !node.is_object() {
        return Ok(None);
    }

    let path = ["url", "path", "slug"]
        .iter()
        .find_map(|key| node.get(*key).and_then(Value::as_str))
        .ok_or_else(|| AggregateError::Data {
            source_name: PAGES_SOURCE.to_string(),
            message: "page node has no `url`, `path` or `slug`".to_string(),
        })?;

    let id = node.get("id").and_then(Value::as_str).unwrap_or_default();
    Ok(Some(BuiltPage::new(id, path)))
}

/// Aggregate mapped sources into buckets.
///
/// Sources are processed in mapping order and records in query order, so
/// identical inputs always produce identical buckets. Every bucket named by
/// the mapping is present in the result, even when empty.
pub fn aggregate(
    sources: &QueryData,
    ctx: &AggregationContext,
    mapping: &[MappingEntry],
) -> Result<Buckets> {
    let mut buckets: Buckets = sitemap_types(mapping)?
        .into_iter()
        .map(|t| (t.bucket.clone(), SitemapBucket::new(t.bucket)))
        .collect();

    for entry in mapping {
        let Some(value) = sources.get(&entry.source) else {
            debug!(source = %entry.source, "source not in query results");
            continue;
        };

        let kind = entry.kind();
        let bucket = buckets
            .entry(entry.sitemap.clone())
            .or_insert_with(|| SitemapBucket::new(entry.sitemap.clone()));
        let mut excluded = 0usize;
        let before = bucket.len();

        for node in edge_nodes(&entry.source, value)? {
            let Some(raw) = RawRecord::from_node(kind, node) else {
                continue;
            };

            if let Some(slug) = raw.slug()
                && !ctx.exclusion.is_included(slug)
            {
                trace!(source = %entry.source, slug, "excluded record");
                excluded += 1;
                continue;
            }

            let record = normalize(&entry.source, raw)?;
            let record = resolve(record, &ctx.built_pages, &ctx.path_prefix);
            let url = ctx.absolute_url(record.output_path())?;
            bucket.entries.push(SitemapEntry { url, record });
        }

        debug!(
            source = %entry.source,
            sitemap = %entry.sitemap,
            added = bucket.len() - before,
            excluded,
            "aggregated source"
        );
    }

    let uncaught = if ctx.add_uncaught_pages {
        reconcile(&mut buckets, ctx)?
    } else {
        0
    };

    info!(
        buckets = buckets.len(),
        entries = buckets.values().map(SitemapBucket::len).sum::<usize>(),
        uncaught,
        "aggregation complete"
    );

    Ok(buckets)
}

/// Append every built page no entry claims to the default bucket.
/// Returns the number of pages added.
fn reconcile(buckets: &mut Buckets, ctx: &AggregationContext) -> Result<usize> {
    let mut claimed: HashSet<&str> = buckets
        .values()
        .flat_map(|b| b.entries.iter().map(SitemapEntry::path))
        .collect();

    let mut uncaught = Vec::new();
    for page in &ctx.built_pages {
        if !claimed.insert(page.path.as_str()) {
            continue;
        }

        let mut record = ContentRecord::new(page.path.clone()).with_path(page.path.clone());
        if !page.id.is_empty() {
            record
                .metadata
                .insert("id".to_string(), Value::String(page.id.clone()));
        }

        uncaught.push(SitemapEntry {
            url: ctx.absolute_url(&page.path)?,
            record,
        });
    }

    let count = uncaught.len();
    buckets
        .entry(DEFAULT_BUCKET.to_string())
        .or_insert_with(|| SitemapBucket::new(DEFAULT_BUCKET))
        .entries
        .extend(uncaught);

    Ok(count)
}
