use crate::cli::OutputFormat;
use crate::core::types::MatchTier;
use crate::matching::scoring::ScoreScale;

const TIERS: [MatchTier; 4] = [
    MatchTier::ExactTranscript,
    MatchTier::Transcript,
    MatchTier::GeneLevel,
    MatchTier::WildcardAnchored,
];

/// Execute scale subcommand
///
/// JSON output is a valid `--score-scale` file and can be edited as a starting point.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn run(format: OutputFormat) -> anyhow::Result<()> {
    let scale = ScoreScale::default();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&scale)?),
        OutputFormat::Text => {
            println!("{:<20} SCORE", "TIER");
            for tier in TIERS {
                println!("{:<20} {}", tier.to_string(), scale.score(tier));
            }
        }
        OutputFormat::Tsv => {
            println!("tier\tscore");
            for tier in TIERS {
                println!("{tier}\t{}", scale.score(tier));
            }
        }
    }

    Ok(())
}
