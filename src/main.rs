//! petur - a static site generator that gives every post and tag a permanent
//! hexadecimal address.

mod build;
mod cli;
mod config;
mod content;
mod doc;
mod logger;
mod markup;
mod registry;
mod render;
mod taxonomy;
mod transform;
mod utils;

use anyhow::{Context, Result};
use build::build_site;
use clap::Parser;
use cli::{Cli, Commands};
use config::SiteConfig;
use content::{Source, load_source};
use markup::CommandConverter;
use registry::Registry;
use taxonomy::Taxonomy;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = SiteConfig::load(&cli)?;

    match cli.command {
        Commands::Build => build_all(&config),
        Commands::Check => check_all(&config),
    }
}

/// Load the registry and every post.
fn load_all(config: &SiteConfig) -> Result<(Registry, Taxonomy, Source)> {
    let lock = &config.build.lock;
    let mut registry = Registry::load(lock)
        .with_context(|| format!("Failed to load identifiers from {}", lock.display()))?;
    log!("registry"; "{} keys from {}", registry.len(), registry.path().display());

    let mut taxonomy = Taxonomy::new();
    let converter = CommandConverter::new(&config.build.markdown);
    let source = load_source(&config.build, &mut registry, &mut taxonomy, &converter)?;
    log!("tags"; "{} tags across {} posts", taxonomy.len(), source.len());

    Ok((registry, taxonomy, source))
}

/// Build the site, then persist the identifiers minted along the way.
///
/// The registry is only saved when every stage succeeded.
fn build_all(config: &SiteConfig) -> Result<()> {
    let (registry, taxonomy, source) = load_all(config)?;
    build_site(config, &source, &taxonomy)?;

    let (total, minted) = (registry.len(), registry.minted());
    registry.save().context("Failed to save identifiers")?;
    log!("registry"; "saved {} keys ({} new)", total, minted);

    Ok(())
}

/// Load everything a build would, report it and write nothing.
fn check_all(config: &SiteConfig) -> Result<()> {
    let (registry, taxonomy, source) = load_all(config)?;
    log!(
        "check"; "{} posts, {} tags, {} new addresses (not saved)",
        source.len(), taxonomy.len(), registry.minted()
    );
    Ok(())
}
