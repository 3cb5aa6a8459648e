//! Sitemap XML generation.
//!
//! Collects aggregated entries per bucket and renders one `<urlset>` per
//! sitemap type plus a `<sitemapindex>` pointing at them.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use sitemapper_core::{ChangeFreq, ContentRecord, SitemapEntry, SitemapType};
use tracing::debug;
use url::Url;

/// Metadata keys checked, in order, for an entry's last modification time.
const LASTMOD_KEYS: [&str; 3] = ["updated_at", "published_at", "created_at"];

/// Placeholder in the resources output pattern.
const RESOURCE_PLACEHOLDER: &str = ":resource";

/// Output locations and the list of sitemaps to render.
#[derive(Debug, Clone)]
pub struct SitemapOptions {
    /// Site base URL.
    pub site_url: Url,

    /// Sitemaps to render, one file each.
    pub sources: Vec<SitemapType>,

    /// Site path of the index file.
    pub index_output: String,

    /// Site path pattern of resource files; `:resource` is the sitemap name.
    pub resources_output: String,

    /// Site path of the stylesheet.
    pub stylesheet_output: String,
}

impl SitemapOptions {
    pub fn new(site_url: Url, sources: Vec<SitemapType>) -> Self {
        Self {
            site_url,
            sources,
            index_output: "/sitemap.xml".to_string(),
            resources_output: "/sitemap-:resource.xml".to_string(),
            stylesheet_output: "/sitemap.xsl".to_string(),
        }
    }

    fn absolute(&self, path: &str) -> String {
        self.site_url
            .join(path)
            .map(String::from)
            .unwrap_or_else(|_| format!("{}{path}", self.site_url.as_str().trim_end_matches('/')))
    }

    /// Absolute URL of the index file.
    pub fn index_url(&self) -> String {
        self.absolute(&self.index_output)
    }

    /// Absolute URL of the stylesheet.
    pub fn stylesheet_url(&self) -> String {
        self.absolute(&self.stylesheet_output)
    }

    /// Site path of the resource file for sitemap `name`.
    pub fn resource_path(&self, name: &str) -> String {
        self.resources_output.replace(RESOURCE_PLACEHOLDER, name)
    }

    /// Absolute URL of the resource file for sitemap `name`.
    pub fn resource_url(&self, name: &str) -> String {
        self.absolute(&self.resource_path(name))
    }

    fn source_for(&self, bucket: &str) -> Option<&SitemapType> {
        self.sources.iter().find(|t| t.bucket == bucket)
    }
}

/// A sitemap URL entry.
#[derive(Debug, Clone, PartialEq)]
struct SitemapUrl {
    /// URL location.
    loc: String,

    /// Last modification date.
    lastmod: Option<DateTime<Utc>>,

    /// Feature image, possibly relative to the site.
    image: Option<String>,
}

impl SitemapUrl {
    fn from_entry(entry: &SitemapEntry) -> Self {
        Self {
            loc: entry.url.clone(),
            lastmod: last_modified(&entry.record),
            image: entry
                .record
                .meta_str("feature_image")
                .filter(|s| !s.is_empty())
                .map(String::from),
        }
    }
}

/// Parse an RFC 3339 timestamp or a plain `YYYY-MM-DD` date.
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn last_modified(record: &ContentRecord) -> Option<DateTime<Utc>> {
    LASTMOD_KEYS
        .iter()
        .filter_map(|key| record.meta_str(key))
        .find_map(parse_timestamp)
}

fn format_lastmod(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Accumulates sitemap URLs per bucket and renders them as XML.
#[derive(Debug, Default)]
pub struct SitemapManager {
    urls: BTreeMap<String, Vec<SitemapUrl>>,
}

impl SitemapManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry to `bucket`.
    pub fn add_url(&mut self, bucket: &str, entry: &SitemapEntry) {
        self.urls
            .entry(bucket.to_string())
            .or_default()
            .push(SitemapUrl::from_entry(entry));
    }

    /// Number of URLs collected for `bucket`.
    pub fn url_count(&self, bucket: &str) -> usize {
        self.urls.get(bucket).map_or(0, Vec::len)
    }

    /// Newest modification time in `bucket`, if any entry has one.
    pub fn last_modified(&self, bucket: &str) -> Option<DateTime<Utc>> {
        self.urls
            .get(bucket)?
            .iter()
            .filter_map(|u| u.lastmod)
            .max()
    }

    fn xml_header(options: &SitemapOptions) -> String {
        let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        xml.push_str(&format!(
            r#"<?xml-stylesheet type="text/xsl" href="{}"?>"#,
            escape_xml(&options.stylesheet_url())
        ));
        xml.push('\n');
        xml
    }

    /// Render the `<urlset>` document for `bucket`.
    ///
    /// Change frequency and priority come from the bucket's sitemap type in
    /// `options`. An unknown or empty bucket renders an empty set.
    pub fn sitemap_xml(&self, bucket: &str, options: &SitemapOptions) -> String {
        let urls = self.urls.get(bucket).map_or(&[][..], Vec::as_slice);
        let source = options.source_for(bucket);
        let changefreq = source.and_then(|s| s.changefreq);
        let priority = source.and_then(|s| s.priority);

        debug!(bucket, count = urls.len(), "generating sitemap");

        let mut xml = Self::xml_header(options);
        xml.push_str(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9""#);
        xml.push_str(r#" xmlns:image="http://www.google.com/schemas/sitemap-image/1.1">"#);
        xml.push('\n');

        for url in urls {
            xml.push_str(&url_to_xml(url, changefreq, priority, &options.site_url));
        }

        xml.push_str("</urlset>\n");
        xml
    }

    /// Render the `<sitemapindex>` document listing every sitemap in
    /// `options.sources`.
    pub fn index_xml(&self, options: &SitemapOptions) -> String {
        let mut xml = Self::xml_header(options);
        xml.push_str(r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#);
        xml.push('\n');

        for source in &options.sources {
            xml.push_str("  <sitemap>\n");
            xml.push_str(&format!(
                "    <loc>{}</loc>\n",
                escape_xml(&options.resource_url(&source.name))
            ));
            if let Some(lastmod) = self.last_modified(&source.bucket) {
                xml.push_str(&format!(
                    "    <lastmod>{}</lastmod>\n",
                    format_lastmod(&lastmod)
                ));
            }
            xml.push_str("  </sitemap>\n");
        }

        xml.push_str("</sitemapindex>\n");
        xml
    }
}

/// Convert a URL entry to XML.
fn url_to_xml(
    url: &SitemapUrl,
    changefreq: Option<ChangeFreq>,
    priority: Option<f32>,
    site_url: &Url,
) -> String {
    let mut xml = String::from("  <url>\n");

    xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&url.loc)));

    if let Some(lastmod) = &url.lastmod {
        xml.push_str(&format!(
            "    <lastmod>{}</lastmod>\n",
            format_lastmod(lastmod)
        ));
    }

    if let Some(changefreq) = changefreq {
        xml.push_str(&format!(
            "    <changefreq>{}</changefreq>\n",
            changefreq.as_str()
        ));
    }

    if let Some(priority) = priority {
        xml.push_str(&format!("    <priority>{priority}</priority>\n"));
    }

    if let Some(image) = url.image.as_deref().and_then(|i| site_url.join(i).ok()) {
        xml.push_str("    <image:image>\n");
        xml.push_str(&format!(
            "      <image:loc>{}</image:loc>\n",
            escape_xml(image.as_str())
        ));
        xml.push_str("    </image:image>\n");
    }

    xml.push_str("  </url>\n");
    xml
}

/// Escape special XML characters.
pub(crate) fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
