//! Sitemap configuration management.

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    error::{CoreError, Result},
    mapping::{MappingEntry, SitemapType, default_mapping, sitemap_types},
};

/// Main configuration structure for Sitemapper.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Sitemap generation settings.
    #[serde(default)]
    pub sitemap: SitemapConfig,
}

/// Options consumed by the post-build sitemap step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitemapConfig {
    /// Query that overrides the built-in page query.
    ///
    /// Only executed when `mapping` is non-empty as well.
    #[serde(default)]
    pub query: Option<String>,

    /// Source to sitemap bucket mapping, in processing order.
    #[serde(default)]
    pub mapping: Vec<MappingEntry>,

    /// Path fragments whose records are left out of every sitemap.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// Prefix for paths of records that match no built page.
    #[serde(default)]
    pub path_prefix: String,

    /// Whether the site templates render a `<link rel="sitemap">` tag.
    ///
    /// Handled by the site templates; the sitemap pipeline ignores it.
    #[serde(default = "default_true")]
    pub create_link_in_head: bool,

    /// Whether built pages no source claimed are added to the `pages` sitemap.
    #[serde(default = "default_true")]
    pub add_uncaught_pages: bool,

    /// Directory the sitemap files are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Custom XSL template; the bundled one is used when unset.
    #[serde(default)]
    pub stylesheet: Option<PathBuf>,
}

fn default_exclude() -> Vec<String> {
    [
        "/dev-404-page",
        "/404",
        "/404.html",
        "/offline-plugin-app-shell-fallback",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

fn default_true() -> bool {
    true
}

fn default_output_dir() -> String {
    "public".to_string()
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            query: None,
            mapping: Vec::new(),
            exclude: default_exclude(),
            path_prefix: String::new(),
            create_link_in_head: true,
            add_uncaught_pages: true,
            output_dir: default_output_dir(),
            stylesheet: None,
        }
    }
}

impl SitemapConfig {
    /// Whether the custom query should run.
    ///
    /// A custom query without a mapping (or the reverse) falls back to the
    /// built-in page query alone.
    pub fn runs_custom_query(&self) -> bool {
        self.query.as_deref().is_some_and(|q| !q.trim().is_empty()) && !self.mapping.is_empty()
    }

    /// The configured mapping, or the default `allSitePage -> pages` one.
    pub fn effective_mapping(&self) -> Vec<MappingEntry> {
        if self.mapping.is_empty() {
            default_mapping()
        } else {
            self.mapping.clone()
        }
    }

    /// The deduplicated list of sitemaps this configuration produces.
    pub fn sitemap_types(&self) -> Result<Vec<SitemapType>> {
        sitemap_types(&self.effective_mapping())
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            CoreError::config_with_source(
                format!("Failed to parse config file: {}", path.display()),
                e,
            )
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file is missing.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::load(path);
        }

        tracing::info!(path = %path.display(), "no configuration file, using defaults");
        let config = Self::default();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration using the config crate, with `SITEMAPPER__*`
    /// environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix("SITEMAPPER").separator("__"))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        let sitemap = &self.sitemap;
        let mut sources = HashSet::new();

        for entry in &sitemap.mapping {
            if entry.source.trim().is_empty() {
                return Err(CoreError::config("sitemap.mapping.source cannot be empty"));
            }

            if entry.sitemap.trim().is_empty() {
                return Err(CoreError::config(format!(
                    "sitemap.mapping `{}` has an empty sitemap name",
                    entry.source
                )));
            }

            if !sources.insert(entry.source.as_str()) {
                return Err(CoreError::config(format!(
                    "source `{}` is mapped more than once",
                    entry.source
                )));
            }

            if let Some(priority) = entry.priority
                && !(0.0..=1.0).contains(&priority)
            {
                return Err(CoreError::config(format!(
                    "priority for `{}` must be between 0.0 and 1.0, got {priority}",
                    entry.source
                )));
            }

            let name = entry.display_name();
            if name.contains(['/', '\\']) || name.chars().any(char::is_whitespace) {
                return Err(CoreError::config(format!(
                    "sitemap name `{name}` cannot contain separators or whitespace"
                )));
            }
        }

        if sitemap.query.is_some() && sitemap.mapping.is_empty() {
            tracing::warn!("sitemap.query is set without a mapping and will not run");
        }

        if sitemap.output_dir.is_empty() {
            return Err(CoreError::config("sitemap.output_dir cannot be empty"));
        }

        sitemap.sitemap_types()?;
        Ok(())
    }
}
