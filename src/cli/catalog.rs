use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};

use crate::catalog::store::FusionCatalog;
use crate::cli::{CatalogSource, OutputFormat};
use crate::core::element::StructuralElement;
use crate::core::fusion::CategoricalFusion;

#[derive(Args)]
pub struct CatalogArgs {
    #[command(subcommand)]
    pub command: CatalogCommands,
}

#[derive(Subcommand)]
pub enum CatalogCommands {
    /// List all categorical fusions in the catalog
    List {
        #[command(flatten)]
        source: CatalogSource,

        /// Filter by knowledgebase (e.g., "CIViC")
        #[arg(long)]
        knowledgebase: Option<String>,

        /// Filter by gene symbol or identifier (e.g., "ALK" or "hgnc:427")
        #[arg(long)]
        gene: Option<String>,
    },

    /// Show details of a specific categorical fusion
    Show {
        /// Fusion ID, or position in the listing
        #[arg(required = true)]
        id: String,

        #[command(flatten)]
        source: CatalogSource,
    },

    /// Export one knowledgebase's fusions as a collection file
    Export {
        /// Knowledgebase name
        #[arg(required = true)]
        knowledgebase: String,

        /// Output file path
        #[arg(required = true)]
        output: PathBuf,

        #[command(flatten)]
        source: CatalogSource,
    },
}

/// Execute catalog subcommand
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded or the operation fails.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: CatalogArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    match args.command {
        CatalogCommands::List {
            source,
            knowledgebase,
            gene,
        } => run_list(
            &source,
            knowledgebase.as_deref(),
            gene.as_deref(),
            format,
            verbose,
        ),
        CatalogCommands::Show { id, source } => run_show(&id, &source, format, verbose),
        CatalogCommands::Export {
            knowledgebase,
            output,
            source,
        } => run_export(&knowledgebase, &output, &source, verbose),
    }
}

fn involves_gene(fusion: &CategoricalFusion, query: &str) -> bool {
    fusion.structure().elements().iter().any(|element| {
        let gene = match element {
            StructuralElement::Gene { gene } => gene,
            StructuralElement::TranscriptSegment(segment) => segment.gene(),
            _ => return false,
        };
        gene.symbol().eq_ignore_ascii_case(query) || gene.id().as_str() == query
    })
}

const MAX_LABEL_WIDTH: usize = 35;

/// Shorten a label to at most `max` characters, marking the cut with `...`
fn truncate_label(label: &str, max: usize) -> String {
    if label.chars().count() <= max {
        return label.to_string();
    }
    let mut short: String = label.chars().take(max.saturating_sub(3)).collect();
    short.push_str("...");
    short
}

fn run_list(
    source: &CatalogSource,
    knowledgebase_filter: Option<&str>,
    gene_filter: Option<&str>,
    format: OutputFormat,
    verbose: bool,
) -> anyhow::Result<()> {
    let catalog = source.load(verbose)?;

    let filtered: Vec<(usize, &CategoricalFusion)> = catalog
        .fusions
        .iter()
        .enumerate()
        .filter(|(i, fusion)| {
            if let Some(kb) = knowledgebase_filter {
                if !catalog
                    .knowledgebase(*i)
                    .is_some_and(|name| name.eq_ignore_ascii_case(kb))
                {
                    return false;
                }
            }
            if let Some(gene) = gene_filter {
                if !involves_gene(fusion, gene) {
                    return false;
                }
            }
            true
        })
        .collect();

    match format {
        OutputFormat::Text => {
            let label_width = filtered
                .iter()
                .map(|(_, f)| f.label().chars().count().min(MAX_LABEL_WIDTH))
                .max()
                .unwrap_or(5)
                .max(5);
            let kb_width = filtered
                .iter()
                .filter_map(|(i, _)| catalog.knowledgebase(*i).map(str::len))
                .max()
                .unwrap_or(13)
                .max(13);

            println!(
                "{:>5}  {:<label_width$}  {:<kb_width$}  STRUCTURE",
                "#", "LABEL", "KNOWLEDGEBASE"
            );
            println!("{}", "-".repeat(5 + label_width + kb_width + 20));
            for (i, fusion) in &filtered {
                let label = truncate_label(&fusion.label(), MAX_LABEL_WIDTH);
                println!(
                    "{:>5}  {:<label_width$}  {:<kb_width$}  {}",
                    i,
                    label,
                    catalog.knowledgebase(*i).unwrap_or("-"),
                    fusion.structure()
                );
            }
            println!("\nTotal: {} categorical fusions", filtered.len());
        }
        OutputFormat::Json => {
            let output: Vec<serde_json::Value> = filtered
                .iter()
                .map(|(i, fusion)| {
                    serde_json::json!({
                        "index": i,
                        "knowledgebase": catalog.knowledgebase(*i),
                        "label": fusion.label(),
                        "structure": fusion.structure().to_string(),
                    })
                })
                .collect();
            let output = serde_json::json!({
                "collections": &catalog.collections,
                "fusions": output,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("index\tknowledgebase\tlabel\tstructure");
            for (i, fusion) in &filtered {
                println!(
                    "{}\t{}\t{}\t{}",
                    i,
                    catalog.knowledgebase(*i).unwrap_or("-"),
                    fusion.label(),
                    fusion.structure()
                );
            }
        }
    }

    Ok(())
}

fn find_fusion(catalog: &FusionCatalog, id: &str) -> anyhow::Result<usize> {
    catalog
        .position(id)
        .or_else(|| id.parse::<usize>().ok().filter(|&i| i < catalog.len()))
        .ok_or_else(|| anyhow::anyhow!("Categorical fusion '{id}' not found"))
}

fn run_show(
    id: &str,
    source: &CatalogSource,
    format: OutputFormat,
    verbose: bool,
) -> anyhow::Result<()> {
    let catalog = source.load(verbose)?;
    let index = find_fusion(&catalog, id)?;
    let fusion = &catalog.fusions[index];
    let knowledgebase = catalog.knowledgebase(index).unwrap_or("-");

    match format {
        OutputFormat::Text => {
            println!("Categorical fusion: {}\n", fusion.label());
            println!("Index:         {index}");
            println!("Knowledgebase: {knowledgebase}");
            println!("Structure:     {}", fusion.structure());
            if let Some(nomenclature) = fusion.nomenclature() {
                println!("Nomenclature:  {nomenclature}");
            }
            if let Some(preserved) = fusion.reading_frame_preserved() {
                println!("Reading frame: {}", if preserved { "preserved" } else { "not preserved" });
            }

            println!("\nElements:");
            for (i, element) in fusion.structure().elements().iter().enumerate() {
                println!("  {:>2}. {:<30} {}", i + 1, element.kind(), element);
            }

            if !fusion.xrefs().is_empty() {
                println!("\nCross-references:");
                for xref in fusion.xrefs() {
                    let profile = xref.molecular_profile_id.as_deref().unwrap_or("-");
                    println!(
                        "  - {} (profile {profile}, {} evidence items)",
                        xref.source,
                        xref.evidence_ids.len()
                    );
                }
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "index": index,
                "knowledgebase": knowledgebase,
                "fusion": fusion,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("position\ttype\telement");
            for (i, element) in fusion.structure().elements().iter().enumerate() {
                println!("{}\t{}\t{}", i + 1, element.kind(), element);
            }
        }
    }

    Ok(())
}

fn run_export(
    knowledgebase: &str,
    output: &Path,
    source: &CatalogSource,
    verbose: bool,
) -> anyhow::Result<()> {
    let catalog = source.load(verbose)?;

    let count = (0..catalog.len())
        .filter(|&i| catalog.knowledgebase(i) == Some(knowledgebase))
        .count();
    if count == 0 {
        anyhow::bail!("Knowledgebase '{knowledgebase}' has no fusions in the catalog");
    }

    let json = catalog.to_json(knowledgebase)?;
    std::fs::write(output, json)?;

    println!(
        "Exported {count} {knowledgebase} fusions to {}",
        output.display()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_label() {
        assert_eq!(truncate_label("EML4::ALK", MAX_LABEL_WIDTH), "EML4::ALK");

        let long = format!("{}é-long-identifier-xxxxxxxxx", "a".repeat(31));
        let short = truncate_label(&long, MAX_LABEL_WIDTH);
        assert_eq!(short.chars().count(), MAX_LABEL_WIDTH);
        assert!(short.starts_with(&"a".repeat(31)));
        assert!(short.ends_with("é..."));
    }
}
