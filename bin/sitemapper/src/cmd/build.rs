//! Build command - generates sitemaps for an already built site

use std::{
    path::{Path, PathBuf},
    time::Instant,
};

use color_eyre::eyre::{Result, WrapErr, bail};
use sitemapper_core::Config;
use sitemapper_generator::{PostBuild, SnapshotExecutor};

/// Options for the build command.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// JSON snapshot of the site's data layer.
    pub data: PathBuf,
    /// Override for `sitemap.output_dir`.
    pub output: Option<PathBuf>,
    /// Override for `sitemap.path_prefix`.
    pub path_prefix: Option<String>,
}

/// Run the build command.
///
/// Loads the configuration and data snapshot, then runs the post-build step
/// on a blocking thread. Any file that could not be written fails the command.
pub async fn run(config_path: &Path, options: BuildOptions) -> Result<()> {
    let start = Instant::now();
    tracing::info!(?config_path, ?options, "Starting sitemap build");

    let mut config = if config_path.exists() {
        Config::load_with_env(config_path)
    } else {
        Config::load_or_default(config_path)
    }
    .wrap_err("Failed to load configuration")?;

    if let Some(prefix) = options.path_prefix {
        tracing::info!(path_prefix = %prefix, "Overriding path prefix from CLI");
        config.sitemap.path_prefix = prefix;
    }

    if config.sitemap.create_link_in_head {
        tracing::debug!("create_link_in_head is handled by the site renderer, not here");
    }

    tracing::debug!(?config, "Loaded configuration");

    let snapshot = tokio::fs::read_to_string(&options.data)
        .await
        .wrap_err_with(|| format!("Failed to read data snapshot {}", options.data.display()))?;
    let executor = SnapshotExecutor::from_json(&snapshot).wrap_err("Invalid data snapshot")?;

    let mut step = PostBuild::new(config.sitemap);
    if let Some(output) = options.output {
        step = step.with_output_dir(output);
    }
    let output_dir = step.output_dir().to_path_buf();

    let report = tokio::task::spawn_blocking(move || step.run(&executor))
        .await
        .wrap_err("Sitemap task panicked")?
        .wrap_err("Sitemap generation failed")?;

    let duration = start.elapsed();

    println!();
    if report.is_complete() {
        println!("  Sitemaps generated successfully!");
    } else {
        println!("  Sitemaps generated with errors");
    }
    println!();
    for sitemap in &report.sitemaps {
        println!("  {:<12} {:>6} urls", sitemap.name, sitemap.urls);
    }
    println!();
    println!("  Total URLs: {}", report.total_urls());
    println!("  Files:      {}", report.written.len());
    println!("  Duration:   {:.2}s", duration.as_secs_f64());
    println!("  Output:     {}", output_dir.display());
    println!();

    if !report.is_complete() {
        for failure in &report.failures {
            println!("  ✗ {}: {}", failure.path.display(), failure.error);
        }
        println!();
        bail!("{} sitemap file(s) could not be written", report.failures.len());
    }

    tracing::info!(
        urls = report.total_urls(),
        files = report.written.len(),
        ?duration,
        "Sitemap build completed"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    const SNAPSHOT: &str = r#"{
        "data": {
            "site": { "siteMetadata": { "siteUrl": "https://example.com" } },
            "allSitePage": { "edges": [
                { "node": { "id": "home", "slug": "/", "url": "/" } },
                { "node": { "id": "about", "slug": "/about/", "url": "/about/" } }
            ] }
        }
    }"#;

    #[tokio::test]
    async fn test_build_with_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data.json");
        fs::write(&data, SNAPSHOT).unwrap();
        let out = dir.path().join("public");

        let options = BuildOptions {
            data,
            output: Some(out.clone()),
            path_prefix: None,
        };
        run(&dir.path().join("missing.toml"), options).await.unwrap();

        let pages = fs::read_to_string(out.join("sitemap-pages.xml")).unwrap();
        assert!(pages.contains("<loc>https://example.com/about/</loc>"));
        assert!(out.join("sitemap.xml").exists());
        assert!(out.join("sitemap.xsl").exists());
    }

    #[tokio::test]
    async fn test_build_missing_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let options = BuildOptions {
            data: dir.path().join("nope.json"),
            output: Some(dir.path().join("public")),
            path_prefix: None,
        };

        let err = run(&dir.path().join("missing.toml"), options)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read data snapshot"));
    }

    #[tokio::test]
    async fn test_build_fails_on_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data.json");
        fs::write(&data, SNAPSHOT).unwrap();
        let out = dir.path().join("public");
        fs::create_dir_all(out.join("sitemap.xml")).unwrap();

        let options = BuildOptions {
            data,
            output: Some(out.clone()),
            path_prefix: None,
        };
        let err = run(&dir.path().join("missing.toml"), options)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("could not be written"));
        assert!(out.join("sitemap-pages.xml").exists());
    }
}
