// src/main.rs

use anyhow::{Context, Result};
use clap::Parser;
use sbuild::{BuildConfig, Builder, recipes};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "sbuild")]
#[command(author, version, about = "Cross-compile statically linked binaries from pinned sources", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Platform to build for (linux, android, darwin)
    #[arg(short, long)]
    platform: Option<String>,

    /// Architecture to build for (amd64, arm)
    #[arg(short, long)]
    arch: Option<String>,

    /// Working directory for sources and the download cache
    #[arg(long, value_name = "DIR")]
    build_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// List available recipes and exit
    #[arg(long)]
    list: bool,

    /// Directory finalized artifacts are written to
    #[arg(required_unless_present = "list")]
    output_dir: Option<PathBuf>,

    /// Recipes to build, or `all` for every binary recipe
    #[arg(required_unless_present = "list")]
    recipes: Vec<String>,
}

impl Cli {
    /// Configuration file (if any) overridden by command line flags
    fn build_config(&self) -> Result<BuildConfig> {
        let mut config = match &self.config {
            Some(path) => BuildConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => BuildConfig::default(),
        };

        if let Some(platform) = &self.platform {
            config = config.with_platform(platform.as_str());
        }
        if let Some(arch) = &self.arch {
            config = config.with_arch(arch.as_str());
        }
        if let Some(dir) = &self.build_dir {
            config = config.with_build_dir(dir);
        }
        if let Some(dir) = &self.output_dir {
            config = config.with_output_dir(dir);
        }

        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let registry = recipes::builtin();

    if cli.list {
        for name in registry.names() {
            let recipe = registry.lookup(name)?;
            let info = recipe.info();
            let kind = if info.binary { "binary" } else { "library" };
            println!("{:<16} {:<10} {}", info.name, info.version, kind);
        }
        return Ok(());
    }

    let config = cli.build_config()?;
    info!(
        "Building {} for {}/{} into {}",
        cli.recipes.join(", "),
        config.platform,
        config.arch,
        config.output_dir.display()
    );

    let mut builder = Builder::new(&registry, config)?;
    builder.run(cli.recipes.as_slice())?;

    info!("Build finished");
    Ok(())
}
