use serde::Serialize;
use thiserror::Error;
use tracing::trace;

use crate::core::element::{LinkerSequence, StructuralElement, TranscriptSegment};
use crate::core::fusion::{AssayedFusion, CategoricalFusion, StructureError};
use crate::matching::scoring::{BoundaryMatch, LinkerAgreement, MatchScore, ScoreScale};

/// Fusion boundary being compared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    FivePrime,
    ThreePrime,
}

impl std::fmt::Display for Boundary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FivePrime => write!(f, "5'"),
            Self::ThreePrime => write!(f, "3'"),
        }
    }
}

/// A boundary comparison between element kinds that cannot be compared.
/// Never escapes the engine; it is turned into a rejection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot compare {assayed} with {categorical} at the {boundary} boundary")]
pub struct IncompatibleStructure {
    pub boundary: Boundary,
    pub assayed: &'static str,
    pub categorical: &'static str,
}

/// A comparison that could not be carried out because a record is malformed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    #[error("assayed fusion {label} is malformed: {source}")]
    AssayedStructure {
        label: String,
        #[source]
        source: StructureError,
    },

    #[error("categorical fusion {label} is malformed: {source}")]
    CategoricalStructure {
        label: String,
        #[source]
        source: StructureError,
    },
}

/// A categorical fusion that matched, with its score
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult<'c> {
    /// Position of the categorical fusion among the candidates
    pub candidate_index: usize,

    /// The matched categorical fusion
    pub fusion: &'c CategoricalFusion,

    /// Match score details
    pub score: MatchScore,
}

/// Default minimum score for including matches in results (every non-rejected pair)
pub const DEFAULT_MIN_SCORE: u32 = 0;

/// Configuration for the matching engine
#[derive(Debug, Clone, Default)]
pub struct MatchingConfig {
    /// Tier to score table
    pub scale: ScoreScale,
    /// Matches scoring at or below this are left out of results
    pub min_score: u32,
    /// Maximum matches kept per assayed fusion (`None` keeps all)
    pub limit: Option<usize>,
}

/// Everything learned from ranking one assayed fusion against a candidate set
#[derive(Debug, Clone)]
pub struct RankOutcome<'c> {
    /// Matches in ranked order
    pub matches: Vec<MatchResult<'c>>,
    /// Candidates whose comparison failed
    pub failures: Vec<(usize, MatchError)>,
    /// Number of comparisons attempted
    pub compared: usize,
    /// Number of comparisons that ended in rejection
    pub rejected: usize,
}

/// The main matching engine
#[derive(Debug, Clone, Default)]
pub struct MatchingEngine {
    config: MatchingConfig,
}

impl MatchingEngine {
    /// Create a new matching engine with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new matching engine with custom configuration
    #[must_use]
    pub fn with_config(config: MatchingConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Compare one pair; `Ok(None)` means the categorical fusion is rejected
    ///
    /// # Errors
    ///
    /// Returns an error if either record violates the structure invariants.
    pub fn compare(
        &self,
        assayed: &AssayedFusion,
        categorical: &CategoricalFusion,
    ) -> Result<Option<MatchScore>, MatchError> {
        compare_fusions(assayed, categorical, &self.config.scale)
    }

    /// Rank every candidate against the assayed fusion, skipping failed comparisons
    #[must_use]
    pub fn rank<'c>(
        &self,
        assayed: &AssayedFusion,
        candidates: &'c [CategoricalFusion],
    ) -> Vec<MatchResult<'c>> {
        self.rank_candidates(assayed, candidates.iter().enumerate())
            .matches
    }

    /// Rank a set of indexed candidates against the assayed fusion
    ///
    /// Candidates should be supplied in knowledgebase order: ties that remain after
    /// score and transcript-level boundaries keep that order.
    pub fn rank_candidates<'c>(
        &self,
        assayed: &AssayedFusion,
        candidates: impl IntoIterator<Item = (usize, &'c CategoricalFusion)>,
    ) -> RankOutcome<'c> {
        let mut matches = Vec::new();
        let mut failures = Vec::new();
        let mut compared = 0;
        let mut rejected = 0;

        for (candidate_index, fusion) in candidates {
            compared += 1;
            match self.compare(assayed, fusion) {
                Ok(Some(score)) => matches.push(MatchResult {
                    candidate_index,
                    fusion,
                    score,
                }),
                Ok(None) => rejected += 1,
                Err(e) => failures.push((candidate_index, e)),
            }
        }

        // Stable sort keeps candidate order for full ties
        matches.sort_by(|a, b| a.score.rank_cmp(&b.score));
        matches.retain(|m| m.score.score > self.config.min_score);
        if let Some(limit) = self.config.limit {
            matches.truncate(limit);
        }

        RankOutcome {
            matches,
            failures,
            compared,
            rejected,
        }
    }
}

/// Compare an assayed fusion against a categorical fusion
///
/// Pure function of its inputs. `Ok(None)` means the pair is rejected: some
/// boundary is incompatible, so the categorical fusion is not a generalization
/// of the assayed one.
///
/// # Errors
///
/// Returns an error if either record violates the structure invariants.
pub fn compare_fusions(
    assayed: &AssayedFusion,
    categorical: &CategoricalFusion,
    scale: &ScoreScale,
) -> Result<Option<MatchScore>, MatchError> {
    let a = assayed
        .structure()
        .boundaries()
        .map_err(|source| MatchError::AssayedStructure {
            label: assayed.label(),
            source,
        })?;
    let c = categorical
        .structure()
        .boundaries()
        .map_err(|source| MatchError::CategoricalStructure {
            label: categorical.label(),
            source,
        })?;

    let Some(five_prime) = resolve_boundary(Boundary::FivePrime, a.five_prime, c.five_prime) else {
        return Ok(None);
    };
    let Some(three_prime) = resolve_boundary(Boundary::ThreePrime, a.three_prime, c.three_prime)
    else {
        return Ok(None);
    };

    let linker = linker_agreement(
        assayed.structure().linker(),
        categorical.structure().linker(),
    );

    Ok(Some(MatchScore::calculate(
        five_prime,
        three_prime,
        linker,
        scale,
    )))
}

fn resolve_boundary(
    boundary: Boundary,
    assayed: &StructuralElement,
    categorical: &StructuralElement,
) -> Option<BoundaryMatch> {
    match compare_boundary(boundary, assayed, categorical) {
        Ok(Some(outcome)) => Some(outcome),
        Ok(None) => {
            trace!("Rejected at {boundary} boundary: {assayed} vs {categorical}");
            None
        }
        Err(e) => {
            trace!("Rejected: {e}");
            None
        }
    }
}

/// Compare the partner elements found at one boundary
///
/// # Errors
///
/// Returns `IncompatibleStructure` if either element is a linker.
pub fn compare_boundary(
    boundary: Boundary,
    assayed: &StructuralElement,
    categorical: &StructuralElement,
) -> Result<Option<BoundaryMatch>, IncompatibleStructure> {
    use StructuralElement as E;

    match (assayed, categorical) {
        (E::Linker { .. }, _) | (_, E::Linker { .. }) => Err(IncompatibleStructure {
            boundary,
            assayed: assayed.kind(),
            categorical: categorical.kind(),
        }),
        (_, E::MultiplePossibleGenes) => Ok(Some(BoundaryMatch::Wildcard)),
        // An unknown partner is never the same gene as anything, itself included
        (E::UnknownGene, _) | (_, E::UnknownGene) => Ok(None),
        // "Any gene" is not an instance of a specific gene
        (E::MultiplePossibleGenes, _) => Ok(None),
        (E::Gene { gene: a }, E::Gene { gene: c }) => {
            Ok((a.id() == c.id()).then_some(BoundaryMatch::GeneLevel))
        }
        (E::Gene { gene: a }, E::TranscriptSegment(c)) => {
            Ok((a.id() == c.gene().id()).then_some(BoundaryMatch::GeneLevel))
        }
        (E::TranscriptSegment(a), E::Gene { gene: c }) => {
            Ok((a.gene().id() == c.id()).then_some(BoundaryMatch::GeneLevel))
        }
        (E::TranscriptSegment(a), E::TranscriptSegment(c)) => Ok(compare_segments(a, c)),
    }
}

/// Transcript-level comparison of two segments at the same boundary
fn compare_segments(assayed: &TranscriptSegment, categorical: &TranscriptSegment) -> Option<BoundaryMatch> {
    if assayed.gene().id() != categorical.gene().id() {
        return None;
    }

    let a = assayed.junction();
    let c = categorical.junction();
    if a.side != c.side || a.exon != c.exon {
        return None;
    }

    let same_transcript = assayed.transcript() == categorical.transcript();
    let same_strand = assayed.strand() == categorical.strand();
    let same_offset = a.effective_offset() == c.effective_offset();

    // An offset on the categorical side pins the exact position; without one the
    // pattern is exon-level and exon agreement is enough
    if c.offset.is_some() && !(same_transcript && same_strand && same_offset) {
        return None;
    }

    let breakpoint_agrees = match (&a.genomic, &c.genomic) {
        (_, None) => true,
        (Some(a), Some(c)) => a == c,
        (None, Some(_)) => false,
    };

    Some(BoundaryMatch::Transcript {
        exact: same_transcript && same_strand && same_offset && breakpoint_agrees,
    })
}

fn linker_agreement(
    assayed: Option<&LinkerSequence>,
    categorical: Option<&LinkerSequence>,
) -> LinkerAgreement {
    match (assayed, categorical) {
        (None, None) => LinkerAgreement::Compatible,
        (Some(a), Some(c)) if a == c => LinkerAgreement::Compatible,
        _ => LinkerAgreement::Mismatch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::element::{Gene, GenomicLocation, Junction};
    use crate::core::types::{MatchTier, Strand};

    fn eml4() -> Gene {
        Gene::new("hgnc:3190", "EML4").unwrap()
    }

    fn alk() -> Gene {
        Gene::new("hgnc:427", "ALK").unwrap()
    }

    fn eml4_end(exon: u32) -> StructuralElement {
        TranscriptSegment::new(
            eml4(),
            "refseq:NM_019063.5",
            Strand::Positive,
            Junction::end(exon)
                .with_offset(0)
                .with_genomic(GenomicLocation::new("NC_000002.12", 42_296_000 + u64::from(exon))),
        )
        .unwrap()
        .into()
    }

    fn alk_start(exon: u32) -> StructuralElement {
        TranscriptSegment::new(
            alk(),
            "refseq:NM_004304.5",
            Strand::Negative,
            Junction::start(exon)
                .with_offset(0)
                .with_genomic(GenomicLocation::new("NC_000002.12", 29_223_000 + u64::from(exon))),
        )
        .unwrap()
        .into()
    }

    fn assayed(elements: Vec<StructuralElement>) -> AssayedFusion {
        AssayedFusion::new(elements).unwrap()
    }

    fn categorical(elements: Vec<StructuralElement>) -> CategoricalFusion {
        CategoricalFusion::new(elements).unwrap()
    }

    fn score(a: &AssayedFusion, c: &CategoricalFusion) -> Option<MatchScore> {
        MatchingEngine::new().compare(a, c).unwrap()
    }

    #[test]
    fn test_eml4_alk_scenario() {
        let a = assayed(vec![eml4_end(13), alk_start(20)]);
        let candidates = vec![
            categorical(vec![eml4_end(13), alk_start(20)]),
            categorical(vec![eml4_end(2), alk_start(20)]),
            categorical(vec![StructuralElement::MultiplePossibleGenes, alk_start(20)]),
        ];

        let ranked = MatchingEngine::new().rank(&a, &candidates);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].candidate_index, 0);
        assert_eq!(ranked[0].score.tier, MatchTier::ExactTranscript);
        assert_eq!(ranked[0].score.transcript_boundaries, 2);
        assert_eq!(ranked[1].candidate_index, 2);
        assert_eq!(ranked[1].score.tier, MatchTier::WildcardAnchored);
        assert_eq!(ranked[1].score.transcript_boundaries, 1);
        assert!(ranked[1].score.score > 0);
        assert!(ranked[0].score.score > ranked[1].score.score);
    }

    #[test]
    fn test_gene_level_match() {
        let a = assayed(vec![eml4_end(13), alk_start(20)]);
        let c = categorical(vec![StructuralElement::gene(eml4()), alk_start(20)]);
        let s = score(&a, &c).unwrap();
        assert_eq!(s.tier, MatchTier::GeneLevel);
        assert_eq!(s.transcript_boundaries, 1);
    }

    #[test]
    fn test_assayed_gene_against_categorical_segment() {
        assert_eq!(
            compare_boundary(
                Boundary::FivePrime,
                &StructuralElement::gene(eml4()),
                &eml4_end(13)
            ),
            Ok(Some(BoundaryMatch::GeneLevel))
        );
        assert_eq!(
            compare_boundary(
                Boundary::FivePrime,
                &StructuralElement::gene(alk()),
                &eml4_end(13)
            ),
            Ok(None)
        );

        let a = assayed(vec![StructuralElement::gene(eml4()), alk_start(20)]);
        let c = categorical(vec![eml4_end(13), alk_start(20)]);
        let s = score(&a, &c).unwrap();
        assert_eq!(s.tier, MatchTier::GeneLevel);
        assert_eq!(s.transcript_boundaries, 1);
    }

    #[test]
    fn test_missing_assayed_offset_reads_as_zero() {
        let no_offset: StructuralElement = TranscriptSegment::new(
            eml4(),
            "refseq:NM_019063.5",
            Strand::Positive,
            Junction::end(13).with_genomic(GenomicLocation::new("NC_000002.12", 42_296_013)),
        )
        .unwrap()
        .into();

        assert_eq!(
            compare_boundary(Boundary::FivePrime, &no_offset, &eml4_end(13)),
            Ok(Some(BoundaryMatch::Transcript { exact: true }))
        );

        let a = assayed(vec![no_offset, alk_start(20)]);
        let c = categorical(vec![eml4_end(13), alk_start(20)]);
        assert_eq!(score(&a, &c).unwrap().tier, MatchTier::ExactTranscript);
    }

    #[test]
    fn test_gene_match_by_id_not_symbol() {
        let stale = Gene::new("hgnc:3190", "C2orf2").unwrap();
        let a = assayed(vec![StructuralElement::gene(eml4()), StructuralElement::gene(alk())]);
        let c = categorical(vec![StructuralElement::gene(stale), StructuralElement::gene(alk())]);
        assert_eq!(score(&a, &c).unwrap().tier, MatchTier::GeneLevel);

        let other_id = Gene::new("hgnc:9999", "EML4").unwrap();
        let c = categorical(vec![StructuralElement::gene(other_id), StructuralElement::gene(alk())]);
        assert!(score(&a, &c).is_none());
    }

    #[test]
    fn test_concrete_gene_mismatch_rejects() {
        let ret = Gene::new("hgnc:9967", "RET").unwrap();
        let a = assayed(vec![eml4_end(13), alk_start(20)]);
        let c = categorical(vec![eml4_end(13), StructuralElement::gene(ret)]);
        assert!(score(&a, &c).is_none());
    }

    #[test]
    fn test_unknown_partner_never_matches_concrete_gene() {
        let a = assayed(vec![StructuralElement::UnknownGene, alk_start(20)]);
        let c = categorical(vec![eml4_end(13), alk_start(20)]);
        assert!(score(&a, &c).is_none());

        let wildcard = categorical(vec![StructuralElement::MultiplePossibleGenes, alk_start(20)]);
        assert_eq!(
            score(&a, &wildcard).unwrap().tier,
            MatchTier::WildcardAnchored
        );
    }

    #[test]
    fn test_double_wildcard_matches_everything_at_lowest_tier() {
        let c = categorical(vec![
            StructuralElement::MultiplePossibleGenes,
            StructuralElement::MultiplePossibleGenes,
        ]);
        let fusions = [
            assayed(vec![eml4_end(13), alk_start(20)]),
            assayed(vec![StructuralElement::gene(eml4()), StructuralElement::UnknownGene]),
            assayed(vec![
                StructuralElement::UnknownGene,
                StructuralElement::linker("ACG").unwrap(),
                StructuralElement::gene(alk()),
            ]),
        ];
        for a in &fusions {
            let s = score(a, &c).unwrap();
            assert_eq!(s.tier, MatchTier::WildcardAnchored);
            assert_eq!(s.score, ScoreScale::default().wildcard_anchored);
        }
    }

    #[test]
    fn test_exon_level_pattern_matches_without_offset() {
        let a_segment = TranscriptSegment::new(
            eml4(),
            "refseq:NM_019063.5",
            Strand::Positive,
            Junction::end(13).with_offset(25),
        )
        .unwrap();
        let c_segment = TranscriptSegment::new(
            eml4(),
            "ensembl:ENST00000318522.10",
            Strand::Positive,
            Junction::end(13),
        )
        .unwrap();
        let a = assayed(vec![a_segment.into(), alk_start(20)]);
        let c = categorical(vec![c_segment.into(), alk_start(20)]);
        assert_eq!(score(&a, &c).unwrap().tier, MatchTier::Transcript);
    }

    #[test]
    fn test_offset_pattern_requires_same_offset() {
        let with_offset = |offset| -> StructuralElement {
            TranscriptSegment::new(
                eml4(),
                "refseq:NM_019063.5",
                Strand::Positive,
                Junction::end(13).with_offset(offset),
            )
            .unwrap()
            .into()
        };
        let a = assayed(vec![with_offset(5), alk_start(20)]);
        let c = categorical(vec![with_offset(-5), alk_start(20)]);
        assert!(score(&a, &c).is_none());
    }

    #[test]
    fn test_breakpoint_disagreement_is_not_exact() {
        let shifted: StructuralElement = TranscriptSegment::new(
            eml4(),
            "refseq:NM_019063.5",
            Strand::Positive,
            Junction::end(13)
                .with_offset(0)
                .with_genomic(GenomicLocation::new("NC_000002.12", 1)),
        )
        .unwrap()
        .into();
        let a = assayed(vec![eml4_end(13), alk_start(20)]);
        let c = categorical(vec![shifted, alk_start(20)]);
        assert_eq!(score(&a, &c).unwrap().tier, MatchTier::Transcript);
    }

    #[test]
    fn test_linker_caps_exact_tier() {
        let linker = |seq| StructuralElement::linker(seq).unwrap();
        let a = assayed(vec![eml4_end(13), linker("ACGT"), alk_start(20)]);

        let same = categorical(vec![eml4_end(13), linker("acgt"), alk_start(20)]);
        assert_eq!(score(&a, &same).unwrap().tier, MatchTier::ExactTranscript);

        let different = categorical(vec![eml4_end(13), linker("TTTT"), alk_start(20)]);
        assert_eq!(score(&a, &different).unwrap().tier, MatchTier::Transcript);

        let missing = categorical(vec![eml4_end(13), alk_start(20)]);
        assert_eq!(score(&a, &missing).unwrap().tier, MatchTier::Transcript);
    }

    #[test]
    fn test_compare_boundary_rejects_linker_internally() {
        let linker = StructuralElement::linker("ACGT").unwrap();
        let err = compare_boundary(Boundary::FivePrime, &linker, &eml4_end(13)).unwrap_err();
        assert_eq!(err.assayed, "LinkerSequenceElement");
        assert_eq!(err.to_string(), "cannot compare LinkerSequenceElement with TranscriptSegmentElement at the 5' boundary");
    }

    #[test]
    fn test_rank_ties_keep_candidate_order() {
        let a = assayed(vec![eml4_end(13), alk_start(20)]);
        let gene_pair = || categorical(vec![StructuralElement::gene(eml4()), StructuralElement::gene(alk())]);
        let candidates = vec![
            gene_pair().with_id("first"),
            gene_pair().with_id("second"),
            categorical(vec![eml4_end(13), alk_start(20)]).with_id("exact"),
            gene_pair().with_id("third"),
        ];
        let ids: Vec<_> = MatchingEngine::new()
            .rank(&a, &candidates)
            .iter()
            .map(|m| m.fusion.id().unwrap())
            .collect();
        assert_eq!(ids, vec!["exact", "first", "second", "third"]);
    }

    #[test]
    fn test_rank_applies_limit_and_min_score() {
        let a = assayed(vec![eml4_end(13), alk_start(20)]);
        let candidates = vec![
            categorical(vec![StructuralElement::MultiplePossibleGenes, alk_start(20)]),
            categorical(vec![StructuralElement::gene(eml4()), alk_start(20)]),
            categorical(vec![eml4_end(13), alk_start(20)]),
        ];

        let engine = MatchingEngine::with_config(MatchingConfig {
            limit: Some(2),
            ..MatchingConfig::default()
        });
        let ranked = engine.rank(&a, &candidates);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].candidate_index, 2);
        assert_eq!(ranked[1].candidate_index, 1);

        let engine = MatchingEngine::with_config(MatchingConfig {
            min_score: ScoreScale::default().gene_level,
            ..MatchingConfig::default()
        });
        let ranked = engine.rank(&a, &candidates);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].score.tier, MatchTier::ExactTranscript);
    }
}
