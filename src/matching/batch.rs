use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::catalog::index::CandidateFinder;
use crate::catalog::store::FusionCatalog;
use crate::core::fusion::AssayedFusion;
use crate::matching::engine::{MatchResult, MatchingEngine};
use crate::parsing::records::{DroppedRecord, RecordSet};

/// A comparison that failed for one (assayed, categorical) pair
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonFailure {
    pub assayed_index: usize,
    pub assayed_label: String,
    pub categorical_index: usize,
    pub categorical_label: String,
    pub message: String,
}

/// Counts and failures accumulated over a batch
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchDiagnostics {
    /// Assayed fusions processed
    pub assayed: usize,
    /// Input records that failed validation and were not matched
    pub skipped: Vec<DroppedRecord>,
    /// Pairs compared by the engine
    pub comparisons: usize,
    /// Pairs left out by the partner index without a comparison
    pub filtered: usize,
    /// Pairs that produced a score (before `min_score` and `limit`)
    pub scored: usize,
    /// Matches left in the rankings after `min_score` and `limit`
    pub reported: usize,
    /// Pairs rejected as incompatible
    pub rejected: usize,
    /// Pairs whose comparison failed
    pub failures: Vec<ComparisonFailure>,
}

/// Ranked lists for a batch, one per assayed fusion in input order
#[derive(Debug, Clone)]
pub struct BatchResult<'c> {
    pub rankings: Vec<Vec<MatchResult<'c>>>,
    /// Input position of each entry in `rankings`
    pub input_indices: Vec<usize>,
    pub diagnostics: BatchDiagnostics,
}

struct AssayedOutcome<'c> {
    matches: Vec<MatchResult<'c>>,
    compared: usize,
    filtered: usize,
    rejected: usize,
    failures: Vec<ComparisonFailure>,
}

/// Matches many assayed fusions against a catalog in parallel
pub struct BatchMatcher<'c> {
    catalog: &'c FusionCatalog,
    engine: MatchingEngine,
    /// Number of threads (0 = use rayon default)
    num_threads: usize,
}

impl<'c> BatchMatcher<'c> {
    #[must_use]
    pub fn new(catalog: &'c FusionCatalog, engine: MatchingEngine) -> Self {
        Self {
            catalog,
            engine,
            num_threads: 0,
        }
    }

    /// Set the number of threads
    #[must_use]
    pub fn with_num_threads(mut self, threads: usize) -> Self {
        self.num_threads = threads;
        self
    }

    /// Rank the catalog against every assayed fusion
    ///
    /// Always returns one list per input, in input order. A failed comparison is
    /// recorded in the diagnostics and never aborts the batch.
    #[must_use]
    pub fn run(&self, assayed: &[AssayedFusion]) -> BatchResult<'c> {
        self.run_indexed(assayed, (0..assayed.len()).collect())
    }

    /// Rank the catalog against a parsed record set
    ///
    /// Rankings keep the input positions of the valid records, and every dropped
    /// record is carried into `diagnostics.skipped`.
    #[must_use]
    pub fn run_records(&self, records: &RecordSet<AssayedFusion>) -> BatchResult<'c> {
        let mut result = self.run_indexed(&records.records, records.indices.clone());
        result.diagnostics.skipped.clone_from(&records.dropped);
        if !records.dropped.is_empty() {
            warn!(
                "{} assayed record(s) skipped before matching",
                records.dropped.len()
            );
        }
        result
    }

    fn run_indexed(
        &self,
        assayed: &[AssayedFusion],
        input_indices: Vec<usize>,
    ) -> BatchResult<'c> {
        let outcomes = if self.num_threads == 0 {
            self.match_all(assayed)
        } else {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(self.num_threads)
                .build()
            {
                Ok(pool) => pool.install(|| self.match_all(assayed)),
                Err(e) => {
                    warn!("Could not build a {}-thread pool, using the default: {e}", self.num_threads);
                    self.match_all(assayed)
                }
            }
        };

        let mut diagnostics = BatchDiagnostics {
            assayed: assayed.len(),
            ..BatchDiagnostics::default()
        };
        let mut rankings = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            diagnostics.comparisons += outcome.compared;
            diagnostics.filtered += outcome.filtered;
            diagnostics.rejected += outcome.rejected;
            diagnostics.scored += outcome.compared - outcome.rejected - outcome.failures.len();
            diagnostics.reported += outcome.matches.len();
            diagnostics.failures.extend(outcome.failures);
            rankings.push(outcome.matches);
        }

        debug!(
            "Batch of {} assayed fusions: {} comparisons, {} scored, {} rejected, {} failed",
            diagnostics.assayed,
            diagnostics.comparisons,
            diagnostics.scored,
            diagnostics.rejected,
            diagnostics.failures.len()
        );
        if !diagnostics.failures.is_empty() {
            warn!(
                "{} comparison(s) failed and were skipped",
                diagnostics.failures.len()
            );
        }

        BatchResult {
            rankings,
            input_indices,
            diagnostics,
        }
    }

    fn match_all(&self, assayed: &[AssayedFusion]) -> Vec<AssayedOutcome<'c>> {
        assayed
            .par_iter()
            .enumerate()
            .map(|(index, fusion)| self.match_one(index, fusion))
            .collect()
    }

    fn match_one(&self, assayed_index: usize, assayed: &AssayedFusion) -> AssayedOutcome<'c> {
        let catalog = self.catalog;
        let candidates = CandidateFinder::new(catalog).find_candidates(assayed);
        let filtered = catalog.len() - candidates.len();

        let outcome = self.engine.rank_candidates(
            assayed,
            candidates
                .into_iter()
                .filter_map(|i| catalog.get(i).map(|fusion| (i, fusion))),
        );

        let failures = outcome
            .failures
            .into_iter()
            .map(|(categorical_index, error)| ComparisonFailure {
                assayed_index,
                assayed_label: assayed.label(),
                categorical_index,
                categorical_label: catalog
                    .get(categorical_index)
                    .map(|c| c.label())
                    .unwrap_or_default(),
                message: error.to_string(),
            })
            .collect();

        AssayedOutcome {
            matches: outcome.matches,
            compared: outcome.compared,
            filtered,
            rejected: outcome.rejected,
            failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::element::{Gene, StructuralElement};
    use crate::core::fusion::CategoricalFusion;
    use crate::core::types::MatchTier;
    use crate::matching::engine::MatchingConfig;
    use crate::parsing::records::parse_assayed_text;

    fn gene(id: &str, symbol: &str) -> StructuralElement {
        StructuralElement::gene(Gene::new(id, symbol).unwrap())
    }

    fn catalog() -> FusionCatalog {
        FusionCatalog::from_fusions(
            "test",
            vec![
                CategoricalFusion::new(vec![gene("hgnc:3190", "EML4"), gene("hgnc:427", "ALK")])
                    .unwrap()
                    .with_id("eml4-alk"),
                CategoricalFusion::new(vec![StructuralElement::MultiplePossibleGenes, gene("hgnc:427", "ALK")])
                    .unwrap()
                    .with_id("v-alk"),
                CategoricalFusion::new(vec![gene("hgnc:1014", "BCR"), gene("hgnc:76", "ABL1")])
                    .unwrap()
                    .with_id("bcr-abl1"),
            ],
        )
    }

    fn assayed() -> Vec<AssayedFusion> {
        vec![
            AssayedFusion::new(vec![gene("hgnc:1014", "BCR"), gene("hgnc:76", "ABL1")]).unwrap(),
            AssayedFusion::new(vec![StructuralElement::UnknownGene, gene("hgnc:427", "ALK")]).unwrap(),
            AssayedFusion::new(vec![gene("hgnc:3190", "EML4"), gene("hgnc:427", "ALK")]).unwrap(),
            AssayedFusion::new(vec![gene("hgnc:11100", "SMARCB1"), gene("hgnc:427", "ALK")]).unwrap(),
        ]
    }

    fn ids(ranking: &[MatchResult<'_>]) -> Vec<String> {
        ranking
            .iter()
            .map(|m| m.fusion.id().unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn test_one_ranking_per_input_in_order() {
        let catalog = catalog();
        let result = BatchMatcher::new(&catalog, MatchingEngine::new()).run(&assayed());

        assert_eq!(result.rankings.len(), 4);
        assert_eq!(ids(&result.rankings[0]), vec!["bcr-abl1"]);
        assert_eq!(ids(&result.rankings[1]), vec!["v-alk"]);
        assert_eq!(ids(&result.rankings[2]), vec!["eml4-alk", "v-alk"]);
        assert_eq!(ids(&result.rankings[3]), vec!["v-alk"]);
        assert_eq!(result.rankings[2][0].score.tier, MatchTier::GeneLevel);

        let d = &result.diagnostics;
        assert_eq!(d.assayed, 4);
        assert_eq!(d.comparisons + d.filtered, 12);
        assert_eq!(d.scored, 5);
        assert_eq!(d.reported, 5);
        assert!(d.skipped.is_empty());
        assert_eq!(result.input_indices, vec![0, 1, 2, 3]);
        assert!(d.failures.is_empty());
    }

    #[test]
    fn test_prefilter_matches_full_scan() {
        let catalog = catalog();
        let engine = MatchingEngine::new();
        let result = BatchMatcher::new(&catalog, engine.clone()).run(&assayed());

        for (fusion, ranking) in assayed().iter().zip(&result.rankings) {
            let full = engine.rank(fusion, &catalog.fusions);
            assert_eq!(ids(ranking), ids(&full));
        }
    }

    #[test]
    fn test_run_is_idempotent_across_thread_counts() {
        let catalog = catalog();
        let inputs = assayed();
        let first = BatchMatcher::new(&catalog, MatchingEngine::new()).run(&inputs);
        let second = BatchMatcher::new(&catalog, MatchingEngine::new())
            .with_num_threads(2)
            .run(&inputs);

        assert_eq!(first.rankings.len(), second.rankings.len());
        for (a, b) in first.rankings.iter().zip(&second.rankings) {
            let a: Vec<_> = a.iter().map(|m| (m.candidate_index, m.score)).collect();
            let b: Vec<_> = b.iter().map(|m| (m.candidate_index, m.score)).collect();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_reported_counts_after_limit() {
        let catalog = catalog();
        let engine = MatchingEngine::with_config(MatchingConfig {
            limit: Some(1),
            ..MatchingConfig::default()
        });
        let result = BatchMatcher::new(&catalog, engine).run(&assayed());

        assert_eq!(result.diagnostics.scored, 5);
        assert_eq!(result.diagnostics.reported, 4);
        assert_eq!(ids(&result.rankings[2]), vec!["eml4-alk"]);
    }

    #[test]
    fn test_run_records_keeps_input_positions() {
        let records = parse_assayed_text(
            r#"[
                {"id": "one-partner", "structure": [
                    {"type": "GeneElement", "gene": {"id": "hgnc:427", "symbol": "ALK"}}
                ]},
                {"id": "eml4-alk", "structure": [
                    {"type": "GeneElement", "gene": {"id": "hgnc:3190", "symbol": "EML4"}},
                    {"type": "GeneElement", "gene": {"id": "hgnc:427", "symbol": "ALK"}}
                ]}
            ]"#,
        )
        .unwrap();
        let catalog = catalog();
        let result = BatchMatcher::new(&catalog, MatchingEngine::new()).run_records(&records);

        assert_eq!(result.rankings.len(), 1);
        assert_eq!(result.input_indices, vec![1]);
        assert_eq!(ids(&result.rankings[0]), vec!["eml4-alk", "v-alk"]);
        assert_eq!(result.diagnostics.assayed, 1);
        assert_eq!(result.diagnostics.skipped.len(), 1);
        assert_eq!(result.diagnostics.skipped[0].index, 0);
    }

    #[test]
    fn test_empty_inputs() {
        let catalog = catalog();
        let result = BatchMatcher::new(&catalog, MatchingEngine::new()).run(&[]);
        assert!(result.rankings.is_empty());
        assert_eq!(result.diagnostics.assayed, 0);

        let empty = FusionCatalog::new();
        let result = BatchMatcher::new(&empty, MatchingEngine::new()).run(&assayed());
        assert_eq!(result.rankings.len(), 4);
        assert!(result.rankings.iter().all(Vec::is_empty));
    }
}
