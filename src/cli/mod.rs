//! Command-line interface for fusion-matcher.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **match**: Rank knowledgebase fusions for each assayed fusion in a file
//! - **catalog**: List, show, or export cached categorical fusions
//! - **scale**: Print the default tier score scale
//!
//! ## Usage
//!
//! ```text
//! # Match against the cached knowledgebase collections
//! fusion-matcher match assayed.json
//!
//! # Match against specific collection files, top 3 per fusion
//! fusion-matcher match assayed.json --catalog civic.json --catalog moa.json.gz -n 3
//!
//! # JSON output with a custom score scale
//! fusion-matcher match assayed.json --score-scale scale.json --format json
//!
//! # Inspect the cache
//! fusion-matcher catalog list
//! fusion-matcher catalog show civic:mp:499
//! ```

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use crate::catalog::store::{default_cache_dir, FusionCatalog};

pub mod catalog;
pub mod matches;
pub mod scale;

#[derive(Parser)]
#[command(name = "fusion-matcher")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Match assayed gene fusions against knowledgebase fusion patterns")]
#[command(
    long_about = "fusion-matcher ranks curated knowledgebase fusions for gene fusions observed in patient samples.\n\nEach assayed fusion is compared boundary by boundary against categorical fusions and every compatible pattern is reported with:\n- A match tier (exact transcript, transcript, gene level, wildcard anchored)\n- A priority score from a configurable scale\n- Diagnostics for any comparison that could not be carried out"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rank categorical fusions for each assayed fusion
    Match(matches::MatchArgs),

    /// Inspect cached categorical fusion collections
    Catalog(catalog::CatalogArgs),

    /// Print the default score scale as JSON
    Scale,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Where categorical fusions are loaded from
#[derive(Args)]
pub struct CatalogSource {
    /// Categorical fusion collection file (.json or .json.gz); repeat for several.
    /// Overrides the cache directory
    #[arg(long = "catalog")]
    pub catalogs: Vec<PathBuf>,

    /// Directory of cached collections
    /// (default: $FUSION_MATCHER_DIR, else fusion-matcher in the platform data directory)
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,
}

impl CatalogSource {
    /// Load the catalog from explicit files, else the cache directory
    ///
    /// # Errors
    ///
    /// Returns an error if a collection file cannot be loaded or no cache
    /// directory can be found.
    pub fn load(&self, verbose: bool) -> anyhow::Result<FusionCatalog> {
        if !self.catalogs.is_empty() {
            let mut catalog = FusionCatalog::new();
            for path in &self.catalogs {
                let summary = catalog.add_file(path).map_err(|e| {
                    anyhow::anyhow!("Failed to load catalog {}: {e}", path.display())
                })?;
                if verbose {
                    eprintln!(
                        "Loaded {} {} fusions from {} ({} dropped)",
                        summary.fusions,
                        summary.knowledgebase,
                        path.display(),
                        summary.dropped
                    );
                }
            }
            return Ok(catalog);
        }

        let dir = match &self.cache_dir {
            Some(dir) => dir.clone(),
            None => default_cache_dir().ok_or_else(|| {
                anyhow::anyhow!("No cache directory found; set $FUSION_MATCHER_DIR or pass --cache-dir")
            })?,
        };
        load_cache_dir(&dir, verbose)
    }
}

fn load_cache_dir(dir: &Path, verbose: bool) -> anyhow::Result<FusionCatalog> {
    if !dir.is_dir() {
        anyhow::bail!("Cache directory not found: {}", dir.display());
    }
    let catalog = FusionCatalog::load_cache_dir(dir)?;
    if verbose {
        eprintln!(
            "Loaded {} fusions from {} cached collection(s) in {}",
            catalog.len(),
            catalog.collections.len(),
            dir.display()
        );
    }
    Ok(catalog)
}
