//! Sitemapper CLI
//!
//! Generates XML sitemaps for a static site after it has been built.
//!
//! This is the binary entry point. The library functionality is in `lib.rs`.

use clap::Parser;
use color_eyre::eyre::Result;
use sitemapper::cmd;

/// Command-line interface for Sitemapper.
#[derive(Parser)]
#[command(
    name = "sitemapper",
    version,
    about = "Post-build XML sitemap generator"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "sitemap.toml")]
    config: std::path::PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(clap::Subcommand)]
enum Commands {
    /// Generate sitemaps from a data snapshot
    Build {
        /// JSON snapshot answering the sitemap queries
        #[arg(short, long)]
        data: std::path::PathBuf,
        /// Output directory (overrides sitemap.output_dir)
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,
        /// Override the path prefix (e.g., /blog)
        #[arg(long)]
        path_prefix: Option<String>,
    },
    /// Validate configuration
    Check {
        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    sitemapper::init_tracing(cli.verbose);

    match cli.command {
        Commands::Build {
            data,
            output,
            path_prefix,
        } => {
            let options = cmd::build::BuildOptions {
                data,
                output,
                path_prefix,
            };
            cmd::build::run(&cli.config, options).await?;
        }
        Commands::Check { strict } => {
            cmd::check::run(&cli.config, strict)?;
        }
    }

    Ok(())
}
