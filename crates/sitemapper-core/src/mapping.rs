//! Source to sitemap mapping.
//!
//! Each query source (the alias a result set is returned under) is assigned
//! to a sitemap bucket. Several sources may feed the same bucket; the
//! resulting list of sitemap types drives which files get written.

use serde::{Deserialize, Serialize};

use crate::{
    error::{CoreError, Result},
    record::SourceKind,
};

/// Bucket that receives built pages no source claimed.
pub const DEFAULT_BUCKET: &str = "pages";

/// Source holding the generator's full list of built pages.
pub const PAGES_SOURCE: &str = "allSitePage";

/// Change frequency hint for sitemap entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFreq {
    Always,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFreq {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::Never => "never",
        }
    }
}

/// One configured source and the sitemap it feeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingEntry {
    /// Query alias the records are returned under.
    pub source: String,

    /// Bucket the records land in.
    pub sitemap: String,

    /// Display name used for the output file; defaults to `sitemap`.
    #[serde(default)]
    pub name: Option<String>,

    /// Record shape; inferred from `source` when unset.
    #[serde(default)]
    pub kind: Option<SourceKind>,

    /// Change frequency written for every URL of the bucket.
    #[serde(default)]
    pub changefreq: Option<ChangeFreq>,

    /// Priority written for every URL of the bucket.
    #[serde(default)]
    pub priority: Option<f32>,
}

impl MappingEntry {
    /// Create a mapping from `source` to the `sitemap` bucket.
    pub fn new(source: impl Into<String>, sitemap: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            sitemap: sitemap.into(),
            name: None,
            kind: None,
            changefreq: None,
            priority: None,
        }
    }

    /// Set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Name of the sitemap file this entry contributes to.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.sitemap)
    }

    /// Record shape of this source.
    pub fn kind(&self) -> SourceKind {
        self.kind
            .unwrap_or_else(|| SourceKind::from_source(&self.source))
    }
}

/// The mapping used when none is configured.
pub fn default_mapping() -> Vec<MappingEntry> {
    vec![MappingEntry::new(PAGES_SOURCE, DEFAULT_BUCKET)]
}

/// A sitemap file to generate: display name plus the bucket it renders.
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapType {
    /// Display name, used in the file name.
    pub name: String,

    /// Bucket whose entries the file contains.
    pub bucket: String,

    /// Change frequency for every URL in the file.
    pub changefreq: Option<ChangeFreq>,

    /// Priority for every URL in the file.
    pub priority: Option<f32>,
}

impl SitemapType {
    fn from_entry(entry: &MappingEntry) -> Self {
        Self {
            name: entry.display_name().to_string(),
            bucket: entry.sitemap.clone(),
            changefreq: entry.changefreq,
            priority: entry.priority,
        }
    }
}

/// Deduplicate a mapping into one sitemap type per bucket.
///
/// Types keep the order in which their bucket first appears, and the first
/// entry for a bucket fixes its display name. A later entry naming the same
/// bucket differently, or one display name shared by two buckets, is a
/// configuration error. The default `pages` bucket is always present so
/// reconciled pages have somewhere to go.
pub fn sitemap_types(mapping: &[MappingEntry]) -> Result<Vec<SitemapType>> {
    let mut types: Vec<SitemapType> = Vec::new();

    for entry in mapping {
        let Some(existing) = types.iter_mut().find(|t| t.bucket == entry.sitemap) else {
            types.push(SitemapType::from_entry(entry));
            continue;
        };

        if let Some(name) = &entry.name
            && existing.name != *name
        {
            return Err(CoreError::config(format!(
                "sitemap `{}` is named both `{}` and `{name}`",
                entry.sitemap, existing.name
            )));
        }

        existing.changefreq = existing.changefreq.or(entry.changefreq);
        existing.priority = existing.priority.or(entry.priority);
    }

    for (i, t) in types.iter().enumerate() {
        if let Some(other) = types[i + 1..].iter().find(|o| o.name == t.name) {
            return Err(CoreError::config(format!(
                "sitemap name `{}` is used by both `{}` and `{}`",
                t.name, t.bucket, other.bucket
            )));
        }
    }

    if !types.iter().any(|t| t.bucket == DEFAULT_BUCKET) {
        if let Some(t) = types.iter().find(|t| t.name == DEFAULT_BUCKET) {
            return Err(CoreError::config(format!(
                "sitemap name `{DEFAULT_BUCKET}` is reserved, but `{}` uses it",
                t.bucket
            )));
        }
        types.push(SitemapType::from_entry(&MappingEntry::new(
            PAGES_SOURCE,
            DEFAULT_BUCKET,
        )));
    }

    Ok(types)
}
