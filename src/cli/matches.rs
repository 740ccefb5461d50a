use std::path::PathBuf;

use clap::Args;

use crate::catalog::store::FusionCatalog;
use crate::cli::{CatalogSource, OutputFormat};
use crate::core::fusion::AssayedFusion;
use crate::matching::batch::{BatchDiagnostics, BatchMatcher, BatchResult};
use crate::matching::engine::{MatchResult, MatchingConfig, MatchingEngine, DEFAULT_MIN_SCORE};
use crate::matching::scoring::ScoreScale;
use crate::parsing::records::{parse_assayed_file, DroppedRecord};

#[derive(Args)]
pub struct MatchArgs {
    /// Assayed fusions: a JSON array of records (.json or .json.gz)
    #[arg(required = true)]
    pub input: PathBuf,

    #[command(flatten)]
    pub source: CatalogSource,

    /// JSON file with the tier score scale (see `fusion-matcher scale`)
    #[arg(long)]
    pub score_scale: Option<PathBuf>,

    /// Number of matches to show per assayed fusion (all by default)
    #[arg(short = 'n', long)]
    pub max_matches: Option<usize>,

    /// Only report matches scoring above this value
    #[arg(long, default_value_t = DEFAULT_MIN_SCORE)]
    pub min_score: u32,

    /// Worker threads (0 = one per core)
    #[arg(long, default_value = "0")]
    pub threads: usize,
}

/// Execute match subcommand
///
/// # Errors
///
/// Returns an error if the input, catalog or score scale cannot be loaded.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: MatchArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let assayed = parse_assayed_file(&args.input)?;

    if verbose {
        eprintln!(
            "Parsed {} assayed fusions from {} ({} dropped)",
            assayed.len(),
            args.input.display(),
            assayed.dropped.len()
        );
    }

    let scale = match &args.score_scale {
        Some(path) => ScoreScale::load_from_file(path)?,
        None => ScoreScale::default(),
    };

    let catalog = args.source.load(verbose)?;
    if catalog.is_empty() {
        eprintln!("Warning: Catalog is empty, no categorical fusions to match against.");
    }

    let config = MatchingConfig {
        scale,
        min_score: args.min_score,
        limit: args.max_matches,
    };
    let result = BatchMatcher::new(&catalog, MatchingEngine::with_config(config))
        .with_num_threads(args.threads)
        .run_records(&assayed);
    let entries = entries(&assayed.records, &result);

    match format {
        OutputFormat::Text => {
            print_text_results(&entries, &catalog);
            print_text_diagnostics(&result.diagnostics, verbose);
        }
        OutputFormat::Json => print_json_results(&entries, &catalog, &result.diagnostics)?,
        OutputFormat::Tsv => {
            print_tsv_results(&entries, &catalog);
            for skipped in &result.diagnostics.skipped {
                eprintln!("Skipped assayed record {}: {}", skipped.index, skipped.reason);
            }
        }
    }

    Ok(())
}

/// One input record, in input order
enum Entry<'a, 'c> {
    Matched {
        index: usize,
        fusion: &'a AssayedFusion,
        matches: &'a [MatchResult<'c>],
    },
    Skipped(&'a DroppedRecord),
}

impl Entry<'_, '_> {
    fn index(&self) -> usize {
        match self {
            Self::Matched { index, .. } => *index,
            Self::Skipped(dropped) => dropped.index,
        }
    }
}

fn entries<'a, 'c>(
    records: &'a [AssayedFusion],
    result: &'a BatchResult<'c>,
) -> Vec<Entry<'a, 'c>> {
    let mut entries: Vec<Entry<'a, 'c>> = records
        .iter()
        .zip(&result.input_indices)
        .zip(&result.rankings)
        .map(|((fusion, &index), matches)| Entry::Matched {
            index,
            fusion,
            matches,
        })
        .chain(result.diagnostics.skipped.iter().map(Entry::Skipped))
        .collect();
    entries.sort_by_key(Entry::index);
    entries
}

fn print_text_results(entries: &[Entry<'_, '_>], catalog: &FusionCatalog) {
    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            println!("\n{}", "─".repeat(60));
        }

        let (fusion, matches) = match entry {
            Entry::Matched { fusion, matches, .. } => (*fusion, *matches),
            Entry::Skipped(dropped) => {
                println!("\nRecord {}: skipped", dropped.index);
                println!("   {}", dropped.reason);
                continue;
            }
        };

        println!("\n{}", fusion.label());
        if fusion.id().is_some() {
            println!("   Structure: {}", fusion.structure());
        }

        if matches.is_empty() {
            println!("   No matching categorical fusions.");
            continue;
        }

        for (rank, m) in matches.iter().enumerate() {
            println!(
                "\n   #{} {} [{}]",
                rank + 1,
                m.fusion.label(),
                catalog.knowledgebase(m.candidate_index).unwrap_or("-")
            );
            println!("      Structure: {}", m.fusion.structure());
            println!(
                "      Tier: {}  Score: {}  Transcript boundaries: {}",
                m.score.tier, m.score.score, m.score.transcript_boundaries
            );
        }
    }
    println!();
}

fn print_text_diagnostics(diagnostics: &BatchDiagnostics, verbose: bool) {
    if verbose {
        eprintln!(
            "{} comparisons ({} filtered by partner), {} scored, {} reported, {} rejected, {} skipped",
            diagnostics.comparisons,
            diagnostics.filtered,
            diagnostics.scored,
            diagnostics.reported,
            diagnostics.rejected,
            diagnostics.skipped.len()
        );
    }
    if !diagnostics.failures.is_empty() {
        eprintln!("Failed comparisons:");
        for failure in &diagnostics.failures {
            eprintln!(
                "  {} vs {}: {}",
                failure.assayed_label, failure.categorical_label, failure.message
            );
        }
    }
}

fn print_json_results(
    entries: &[Entry<'_, '_>],
    catalog: &FusionCatalog,
    diagnostics: &BatchDiagnostics,
) -> anyhow::Result<()> {
    let results: Vec<serde_json::Value> = entries
        .iter()
        .map(|entry| match entry {
            Entry::Matched {
                index,
                fusion,
                matches,
            } => {
                let matches: Vec<serde_json::Value> = matches
                    .iter()
                    .enumerate()
                    .map(|(rank, m)| {
                        serde_json::json!({
                            "rank": rank + 1,
                            "knowledgebase": catalog.knowledgebase(m.candidate_index),
                            "label": m.fusion.label(),
                            "tier": m.score.tier,
                            "score": m.score.score,
                            "transcript_boundaries": m.score.transcript_boundaries,
                            "fusion": m.fusion,
                        })
                    })
                    .collect();

                serde_json::json!({
                    "assayed": {
                        "index": index,
                        "label": fusion.label(),
                        "fusion": fusion,
                    },
                    "matches": matches,
                })
            }
            Entry::Skipped(dropped) => serde_json::json!({
                "assayed": {
                    "index": dropped.index,
                    "label": null,
                    "fusion": null,
                },
                "matches": [],
                "error": dropped.reason,
            }),
        })
        .collect();

    let output = serde_json::json!({
        "results": results,
        "diagnostics": diagnostics,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv_results(entries: &[Entry<'_, '_>], catalog: &FusionCatalog) {
    println!("assayed_index\tassayed\trank\tknowledgebase\tcategorical\tstructure\ttier\tscore\ttranscript_boundaries");
    for entry in entries {
        let Entry::Matched {
            index,
            fusion,
            matches,
        } = entry
        else {
            continue;
        };
        for (rank, m) in matches.iter().enumerate() {
            println!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                index,
                fusion.label(),
                rank + 1,
                catalog.knowledgebase(m.candidate_index).unwrap_or("-"),
                m.fusion.label(),
                m.fusion.structure(),
                m.score.tier,
                m.score.score,
                m.score.transcript_boundaries,
            );
        }
    }
}
