use std::cmp::Ordering;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::MatchTier;

#[derive(Error, Debug)]
pub enum ScaleError {
    #[error("Failed to read score scale: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse score scale: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Score scale must be strictly descending by tier, got {0:?}")]
    NotDescending(ScoreScale),

    #[error("Wildcard-anchored score must be greater than zero")]
    ZeroWildcard,
}

/// Tier to score table
///
/// Consumers should rely on the relative ordering of tiers, which is enforced by
/// [`ScoreScale::validate`], rather than on the absolute values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreScale {
    pub exact_transcript: u32,
    pub transcript: u32,
    pub gene_level: u32,
    pub wildcard_anchored: u32,
}

impl Default for ScoreScale {
    fn default() -> Self {
        Self {
            exact_transcript: 10,
            transcript: 5,
            gene_level: 2,
            wildcard_anchored: 1,
        }
    }
}

impl ScoreScale {
    /// Score assigned to a tier
    #[must_use]
    pub fn score(&self, tier: MatchTier) -> u32 {
        match tier {
            MatchTier::ExactTranscript => self.exact_transcript,
            MatchTier::Transcript => self.transcript,
            MatchTier::GeneLevel => self.gene_level,
            MatchTier::WildcardAnchored => self.wildcard_anchored,
        }
    }

    /// Check that scores strictly descend with specificity and never reach zero
    ///
    /// # Errors
    ///
    /// Returns an error if the ordering contract is broken.
    pub fn validate(&self) -> Result<(), ScaleError> {
        if self.wildcard_anchored == 0 {
            return Err(ScaleError::ZeroWildcard);
        }
        let descending = self.exact_transcript > self.transcript
            && self.transcript > self.gene_level
            && self.gene_level > self.wildcard_anchored;
        if descending {
            Ok(())
        } else {
            Err(ScaleError::NotDescending(*self))
        }
    }

    /// Load and validate a scale from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn load_from_file(path: &Path) -> Result<Self, ScaleError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse and validate a scale from JSON
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid or the scale fails validation.
    pub fn from_json(json: &str) -> Result<Self, ScaleError> {
        let scale: Self = serde_json::from_str(json)?;
        scale.validate()?;
        Ok(scale)
    }
}

/// How a single boundary (5' or 3') was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryMatch {
    /// Both sides are transcript segments; `exact` when exon, offset,
    /// transcript, strand and breakpoint all agree
    Transcript { exact: bool },
    /// Same gene, but one side is a bare gene element
    GeneLevel,
    /// Categorical side is the "any gene" wildcard
    Wildcard,
}

impl BoundaryMatch {
    #[must_use]
    pub fn is_transcript_level(self) -> bool {
        matches!(self, Self::Transcript { .. })
    }
}

/// Whether the linkers of a pair allow the exact tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkerAgreement {
    /// Both absent, or both present with identical sequences
    Compatible,
    /// Sequences differ, or only one side carries a linker
    Mismatch,
}

/// Combine the two boundary outcomes and the linker state into a tier
#[must_use]
pub fn classify(
    five_prime: BoundaryMatch,
    three_prime: BoundaryMatch,
    linker: LinkerAgreement,
) -> MatchTier {
    use BoundaryMatch::{GeneLevel, Transcript, Wildcard};

    match (five_prime, three_prime) {
        (Wildcard, _) | (_, Wildcard) => MatchTier::WildcardAnchored,
        (GeneLevel, _) | (_, GeneLevel) => MatchTier::GeneLevel,
        (Transcript { exact: true }, Transcript { exact: true })
            if linker == LinkerAgreement::Compatible =>
        {
            MatchTier::ExactTranscript
        }
        (Transcript { .. }, Transcript { .. }) => MatchTier::Transcript,
    }
}

/// Score of one matched (assayed, categorical) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchScore {
    pub tier: MatchTier,

    /// Priority score taken from the [`ScoreScale`]
    pub score: u32,

    /// Boundaries resolved at transcript level (0-2), used to break ties within a tier
    pub transcript_boundaries: u8,
}

impl MatchScore {
    #[must_use]
    pub fn calculate(
        five_prime: BoundaryMatch,
        three_prime: BoundaryMatch,
        linker: LinkerAgreement,
        scale: &ScoreScale,
    ) -> Self {
        let tier = classify(five_prime, three_prime, linker);
        let transcript_boundaries = u8::from(five_prime.is_transcript_level())
            + u8::from(three_prime.is_transcript_level());
        Self {
            tier,
            score: scale.score(tier),
            transcript_boundaries,
        }
    }

    /// Ranking order: higher score first, then more transcript-level boundaries
    #[must_use]
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .cmp(&self.score)
            .then_with(|| other.transcript_boundaries.cmp(&self.transcript_boundaries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXACT: BoundaryMatch = BoundaryMatch::Transcript { exact: true };
    const INEXACT: BoundaryMatch = BoundaryMatch::Transcript { exact: false };

    #[test]
    fn test_default_scale_is_valid() {
        assert!(ScoreScale::default().validate().is_ok());
    }

    #[test]
    fn test_scale_rejects_bad_ordering() {
        let scale = ScoreScale {
            exact_transcript: 10,
            transcript: 10,
            gene_level: 2,
            wildcard_anchored: 1,
        };
        assert!(matches!(scale.validate(), Err(ScaleError::NotDescending(_))));

        let scale = ScoreScale {
            wildcard_anchored: 0,
            ..ScoreScale::default()
        };
        assert!(matches!(scale.validate(), Err(ScaleError::ZeroWildcard)));
    }

    #[test]
    fn test_scale_from_json() {
        let scale = ScoreScale::from_json(
            r#"{"exact_transcript": 100, "transcript": 50, "gene_level": 20, "wildcard_anchored": 10}"#,
        )
        .unwrap();
        assert_eq!(scale.score(MatchTier::GeneLevel), 20);

        assert!(ScoreScale::from_json(
            r#"{"exact_transcript": 1, "transcript": 2, "gene_level": 3, "wildcard_anchored": 4}"#
        )
        .is_err());
    }

    #[test]
    fn test_classify_tiers() {
        let ok = LinkerAgreement::Compatible;
        let bad = LinkerAgreement::Mismatch;

        assert_eq!(classify(EXACT, EXACT, ok), MatchTier::ExactTranscript);
        assert_eq!(classify(EXACT, EXACT, bad), MatchTier::Transcript);
        assert_eq!(classify(EXACT, INEXACT, ok), MatchTier::Transcript);
        assert_eq!(
            classify(EXACT, BoundaryMatch::GeneLevel, ok),
            MatchTier::GeneLevel
        );
        assert_eq!(
            classify(BoundaryMatch::Wildcard, EXACT, ok),
            MatchTier::WildcardAnchored
        );
        assert_eq!(
            classify(BoundaryMatch::GeneLevel, BoundaryMatch::Wildcard, ok),
            MatchTier::WildcardAnchored
        );
    }

    #[test]
    fn test_rank_cmp_uses_transcript_boundaries() {
        let scale = ScoreScale::default();
        let wildcard_with_transcript = MatchScore::calculate(
            BoundaryMatch::Wildcard,
            EXACT,
            LinkerAgreement::Compatible,
            &scale,
        );
        let wildcard_with_gene = MatchScore::calculate(
            BoundaryMatch::Wildcard,
            BoundaryMatch::GeneLevel,
            LinkerAgreement::Compatible,
            &scale,
        );
        assert_eq!(wildcard_with_transcript.score, wildcard_with_gene.score);
        assert_eq!(wildcard_with_transcript.transcript_boundaries, 1);
        assert_eq!(
            wildcard_with_transcript.rank_cmp(&wildcard_with_gene),
            Ordering::Less
        );
    }
}
