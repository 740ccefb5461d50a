//! Fusion matching engine and scoring.
//!
//! This module provides the core matching functionality:
//!
//! - [`MatchingEngine`]: Compares an assayed fusion against categorical fusions
//! - [`MatchScore`]: Tier and priority score of one matched pair
//! - [`ScoreScale`]: Configurable tier to score table
//! - [`BatchMatcher`]: Parallel matching of many assayed fusions against a catalog
//!
//! ## Matching Algorithm
//!
//! Each boundary (5' and 3') is compared on its own:
//!
//! 1. **Wildcard**: A categorical "any gene" partner accepts every assayed partner
//! 2. **Gene identity**: Partners must share a stable gene identifier; an unknown
//!    partner is never the same as a concrete gene
//! 3. **Gene level**: A bare gene on either side stops the comparison at gene level
//! 4. **Transcript level**: Two transcript segments must agree on exon; an offset on
//!    the categorical side also pins transcript, strand and offset
//!
//! Any rejected boundary rejects the whole pair.
//!
//! ## Tiers
//!
//! | Tier | Condition | Default score |
//! |------|-----------|---------------|
//! | Exact transcript | Both boundaries exact, linkers agree | 10 |
//! | Transcript | Both boundaries at transcript level | 5 |
//! | Gene level | Some boundary only at gene level | 2 |
//! | Wildcard anchored | Some boundary matched a wildcard | 1 |
//!
//! Within a score, matches with more transcript-level boundaries rank first; full
//! ties keep knowledgebase order.
//!
//! ## Example
//!
//! ```rust,no_run
//! use fusion_matcher::{AssayedFusion, FusionCatalog, MatchingEngine};
//!
//! let catalog = FusionCatalog::load_from_file("civic.json".as_ref()).unwrap();
//! let assayed: AssayedFusion = serde_json::from_str(r#"{"structure": [
//!     {"type": "GeneElement", "gene": {"id": "hgnc:3190", "symbol": "EML4"}},
//!     {"type": "GeneElement", "gene": {"id": "hgnc:427", "symbol": "ALK"}}
//! ]}"#).unwrap();
//!
//! let engine = MatchingEngine::new();
//! for m in engine.rank(&assayed, &catalog.fusions) {
//!     println!("{}: {} ({})", m.fusion.label(), m.score.tier, m.score.score);
//! }
//! ```

pub mod batch;
pub mod engine;
pub mod scoring;
