//! Content records, built pages and sitemap buckets.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Flat metadata attached to a record, keyed by field name.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Shape of the records a source returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Markdown content nodes: slug under `fields.slug`, optional `frontmatter`.
    Markdown,
    /// Any other node: slug at the top level.
    Generic,
}

impl SourceKind {
    /// Source name that holds markdown content nodes.
    pub const MARKDOWN_SOURCE: &'static str = "allMarkdownRemark";

    /// Infer the record shape from a source name.
    pub fn from_source(source: &str) -> Self {
        if source == Self::MARKDOWN_SOURCE {
            Self::Markdown
        } else {
            Self::Generic
        }
    }

    /// Dotted location of the slug field, for error messages.
    pub fn slug_field(&self) -> &'static str {
        match self {
            Self::Markdown => "fields.slug",
            Self::Generic => "slug",
        }
    }
}

/// One content item from one source, in canonical shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    /// Content-declared relative path.
    pub slug: String,

    /// Resolved output path, set by path resolution.
    #[serde(default)]
    pub path: Option<String>,

    /// Source-specific extra fields.
    #[serde(default)]
    pub metadata: Metadata,
}

impl ContentRecord {
    /// Create an unresolved record.
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            path: None,
            metadata: Metadata::new(),
        }
    }

    /// Set the resolved path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Resolved path, or the slug when unresolved.
    pub fn output_path(&self) -> &str {
        self.path.as_deref().unwrap_or(&self.slug)
    }

    /// A string metadata value.
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(serde_json::Value::as_str)
    }
}

/// A page from the generator's authoritative list of built pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltPage {
    /// Generator page id.
    #[serde(default)]
    pub id: String,

    /// Output path of the page.
    pub path: String,
}

impl BuiltPage {
    pub fn new(id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
        }
    }
}

/// A URL in a sitemap together with the record it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SitemapEntry {
    /// Absolute URL.
    pub url: String,

    /// Owning record.
    pub record: ContentRecord,
}

impl SitemapEntry {
    /// Resolved path of the entry.
    pub fn path(&self) -> &str {
        self.record.output_path()
    }
}

/// A named group of sitemap entries, rendered into one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SitemapBucket {
    /// Bucket name.
    pub name: String,

    /// Entries in insertion order.
    pub entries: Vec<SitemapEntry>,
}

impl SitemapBucket {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_kind_inference() {
        assert_eq!(
            SourceKind::from_source("allMarkdownRemark"),
            SourceKind::Markdown
        );
        assert_eq!(SourceKind::from_source("allGhostPost"), SourceKind::Generic);
        assert_eq!(SourceKind::from_source("allSitePage"), SourceKind::Generic);
    }

    #[test]
    fn test_source_kind_deserialize() {
        let kind: SourceKind = serde_json::from_str(r#""markdown""#).unwrap();
        assert_eq!(kind, SourceKind::Markdown);
        assert_eq!(kind.slug_field(), "fields.slug");
    }

    #[test]
    fn test_output_path_falls_back_to_slug() {
        let record = ContentRecord::new("/about/");
        assert_eq!(record.output_path(), "/about/");

        let record = record.with_path("/about-us/");
        assert_eq!(record.output_path(), "/about-us/");
    }

    #[test]
    fn test_meta_str() {
        let mut record = ContentRecord::new("/post/");
        record
            .metadata
            .insert("feature_image".into(), "/img/a.png".into());
        record.metadata.insert("weight".into(), 3.into());

        assert_eq!(record.meta_str("feature_image"), Some("/img/a.png"));
        assert_eq!(record.meta_str("weight"), None);
        assert_eq!(record.meta_str("missing"), None);
    }
}
