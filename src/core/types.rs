use serde::{Deserialize, Serialize};

/// Stable external identifier for a gene (e.g. `hgnc:3190`)
///
/// Gene-level comparisons always go through this identifier, never through the
/// symbol, since knowledgebases and callers may carry stale symbol aliases.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GeneId(pub String);

impl GeneId {
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GeneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transcript strand, serialized as `1` / `-1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum Strand {
    Positive,
    Negative,
}

impl TryFrom<i8> for Strand {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Positive),
            -1 => Ok(Self::Negative),
            other => Err(format!("strand must be 1 or -1, got {other}")),
        }
    }
}

impl From<Strand> for i8 {
    fn from(strand: Strand) -> Self {
        match strand {
            Strand::Positive => 1,
            Strand::Negative => -1,
        }
    }
}

impl std::fmt::Display for Strand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Positive => write!(f, "+"),
            Self::Negative => write!(f, "-"),
        }
    }
}

/// Event that produced an assayed fusion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CausativeEvent {
    Rearrangement,
    ReadThrough,
    TransSplicing,
}

/// How the fusion was detected in the sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionEvidence {
    /// Directly observed (e.g. RNA fusion assay)
    Observed,
    /// Inferred from a genomic rearrangement or cytogenetic assay
    Inferred,
}

/// Specificity tier of a matched (assayed, categorical) pair
///
/// Ordered from least to most specific so that `Ord` can be used for ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    /// One boundary matched only through the "any gene" wildcard
    WildcardAnchored,
    /// At least one boundary resolved only through gene identity
    GeneLevel,
    /// Both boundaries transcript-compatible, but linker or transcript details differ
    Transcript,
    /// Exon, offset and breakpoint agree on both boundaries, linkers identical
    ExactTranscript,
}

impl std::fmt::Display for MatchTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WildcardAnchored => write!(f, "wildcard-anchored"),
            Self::GeneLevel => write!(f, "gene-level"),
            Self::Transcript => write!(f, "transcript"),
            Self::ExactTranscript => write!(f, "exact-transcript"),
        }
    }
}
