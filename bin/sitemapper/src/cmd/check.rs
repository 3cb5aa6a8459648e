//! Check command - validate the sitemap configuration

use std::{collections::HashSet, path::Path};

use color_eyre::eyre::{Result, bail};
use sitemapper_core::{Config, SitemapConfig};
use sitemapper_generator::{exclude::ExclusionFilter, query::top_level_selections};

/// Validation result.
#[derive(Debug, Default)]
struct ValidationResult {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationResult {
    fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Run the check command.
///
/// Validates the configuration and reports the sitemaps it would produce.
pub fn run(config_path: &Path, strict: bool) -> Result<()> {
    tracing::info!(?config_path, strict, "Checking configuration");

    let result = validate(config_path);

    // Print summary
    println!();
    println!("Summary:");
    println!("  Errors:   {}", result.errors.len());
    println!("  Warnings: {}", result.warnings.len());

    if result.has_errors() {
        println!();
        println!("Errors:");
        for err in &result.errors {
            println!("  ✗ {err}");
        }
    }

    if result.has_warnings() {
        println!();
        println!("Warnings:");
        for warn in &result.warnings {
            println!("  ⚠ {warn}");
        }
    }

    if result.has_errors() {
        bail!("Validation failed with {} error(s)", result.errors.len());
    }

    if strict && result.has_warnings() {
        bail!(
            "Validation failed with {} warning(s) (strict mode)",
            result.warnings.len()
        );
    }

    println!();
    println!("✓ All checks passed");

    Ok(())
}

fn validate(config_path: &Path) -> ValidationResult {
    let mut result = ValidationResult::default();

    println!("Checking configuration...");
    let config = if config_path.exists() {
        match Config::load(config_path) {
            Ok(c) => {
                println!("  ✓ Configuration valid");
                Some(c)
            }
            Err(e) => {
                result.add_error(format!("Configuration error: {e}"));
                println!("  ✗ Configuration invalid: {e}");
                None
            }
        }
    } else {
        result.add_warning(format!(
            "{} not found, defaults will be used",
            config_path.display()
        ));
        Some(Config::default())
    };

    if let Some(cfg) = config {
        println!("\nChecking sitemaps...");
        list_sitemaps(&cfg.sitemap, &mut result);

        println!("\nChecking query mapping...");
        check_query_mapping(&cfg.sitemap, &mut result);

        println!("\nChecking paths...");
        check_paths(&cfg.sitemap, &mut result);
    }

    result
}

fn list_sitemaps(config: &SitemapConfig, result: &mut ValidationResult) {
    match config.sitemap_types() {
        Ok(types) => {
            for ty in types {
                println!("  ✓ sitemap-{}.xml ({})", ty.name, ty.bucket);
            }
        }
        Err(e) => result.add_error(format!("Sitemap mapping error: {e}")),
    }
}

fn check_query_mapping(config: &SitemapConfig, result: &mut ValidationResult) {
    let query = config.query.as_deref().filter(|q| !q.trim().is_empty());

    match (query, config.mapping.is_empty()) {
        (None, true) => println!("  ✓ Only built pages will be listed"),
        (Some(_), true) => {
            result.add_warning("sitemap.query is set but sitemap.mapping is empty, query ignored");
        }
        (None, false) => {
            result.add_warning(
                "sitemap.mapping is set but sitemap.query is empty, mapped sitemaps will be emitted empty",
            );
        }
        (Some(query), false) => {
            let selected: HashSet<String> = top_level_selections(query)
                .into_iter()
                .map(|s| s.alias)
                .collect();

            for entry in &config.mapping {
                if selected.contains(&entry.source) {
                    println!("  ✓ {} -> {}", entry.source, entry.sitemap);
                } else {
                    result.add_warning(format!(
                        "Mapped source `{}` is not selected by sitemap.query",
                        entry.source
                    ));
                }
            }
        }
    }

    let filter = ExclusionFilter::new(&config.exclude);
    if filter.patterns().len() < config.exclude.len() {
        result.add_warning("sitemap.exclude contains empty patterns, they are ignored");
    }
}

fn check_paths(config: &SitemapConfig, result: &mut ValidationResult) {
    let output = Path::new(&config.output_dir);
    if !output.exists() {
        result.add_warning(format!(
            "Output directory {} does not exist yet",
            output.display()
        ));
    } else if !output.is_dir() {
        result.add_error(format!("{} is not a directory", output.display()));
    } else {
        println!("  ✓ Output directory {}", output.display());
    }

    if let Some(stylesheet) = &config.stylesheet {
        if stylesheet.is_file() {
            println!("  ✓ Stylesheet template {}", stylesheet.display());
        } else {
            result.add_error(format!(
                "Stylesheet template {} not found",
                stylesheet.display()
            ));
        }
    }

    if !config.path_prefix.is_empty() && !config.path_prefix.starts_with('/') {
        result.add_warning(format!(
            "sitemap.path_prefix `{}` should start with '/'",
            config.path_prefix
        ));
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn write_config(dir: &Path, body: &str) -> std::path::PathBuf {
        let path = dir.join("sitemap.toml");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_missing_config_is_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let result = validate(&dir.path().join("sitemap.toml"));

        assert!(!result.has_errors());
        assert!(result.warnings.iter().any(|w| w.contains("defaults")));
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"
[[sitemap.mapping]]
source = "allGhostPost"
sitemap = "posts"
priority = 2.0
"#,
        );

        let result = validate(&path);
        assert!(result.has_errors());
        assert!(run(&path, false).is_err());
    }

    #[test]
    fn test_unselected_mapping_source() {
        let config = SitemapConfig {
            query: Some("{ allGhostPost { edges { node { slug } } } }".to_string()),
            mapping: vec![
                sitemapper_core::MappingEntry::new("allGhostPost", "posts"),
                sitemapper_core::MappingEntry::new("allGhostTag", "tags"),
            ],
            ..SitemapConfig::default()
        };

        let mut result = ValidationResult::default();
        check_query_mapping(&config, &mut result);

        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("allGhostTag"));
    }

    #[test]
    fn test_query_without_mapping() {
        let config = SitemapConfig {
            query: Some("{ allGhostPost { edges { node { slug } } } }".to_string()),
            ..SitemapConfig::default()
        };

        let mut result = ValidationResult::default();
        check_query_mapping(&config, &mut result);
        assert!(result.has_warnings());
    }

    #[test]
    fn test_mapping_without_query() {
        let config = SitemapConfig {
            mapping: vec![sitemapper_core::MappingEntry::new("allGhostPost", "posts")],
            ..SitemapConfig::default()
        };

        let mut result = ValidationResult::default();
        check_query_mapping(&config, &mut result);

        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("emitted empty"));
    }

    #[test]
    fn test_output_dir_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("public");
        fs::write(&file, "").unwrap();

        let config = SitemapConfig {
            output_dir: file.to_string_lossy().to_string(),
            ..SitemapConfig::default()
        };

        let mut result = ValidationResult::default();
        check_paths(&config, &mut result);
        assert!(result.has_errors());
    }

    #[test]
    fn test_strict_mode_fails_on_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sitemap.toml");

        assert!(run(&path, true).is_err());
    }
}
