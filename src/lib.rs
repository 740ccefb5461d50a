//! # fusion-matcher
//!
//! A library for matching gene fusions observed in patient samples against
//! curated knowledgebase fusion patterns.
//!
//! A fusion caller reports what was seen in a sample: two partner genes, often
//! anchored to transcript exons and genomic breakpoints, sometimes with one
//! partner unknown. Knowledgebases describe fusions more loosely: a partner may be
//! "any gene", or given only at gene level. `fusion-matcher` decides which
//! knowledgebase patterns an observed fusion is an instance of, and ranks them
//! from the most to the least specific.
//!
//! ## Features
//!
//! - **Closed element model**: Genes, transcript segments, linkers, wildcards and
//!   unknown partners, validated on construction
//! - **Tiered matching**: Exact transcript, transcript, gene level and
//!   wildcard-anchored matches with a configurable score scale
//! - **Strict rejection**: A concrete gene mismatch at either boundary excludes a
//!   pattern entirely
//! - **Batch matching**: Many assayed fusions against cached knowledgebase
//!   collections in parallel, with per-pair failure diagnostics
//!
//! ## Example
//!
//! ```rust,no_run
//! use fusion_matcher::{BatchMatcher, FusionCatalog, MatchingEngine};
//! use fusion_matcher::parsing::records::parse_assayed_file;
//! use std::path::Path;
//!
//! let catalog = FusionCatalog::load_cache_dir(Path::new("cache")).unwrap();
//! let assayed = parse_assayed_file(Path::new("assayed.json")).unwrap();
//!
//! let result = BatchMatcher::new(&catalog, MatchingEngine::new()).run_records(&assayed);
//! for (fusion, matches) in assayed.records.iter().zip(&result.rankings) {
//!     for m in matches {
//!         println!("{} -> {}: {}", fusion.label(), m.fusion.label(), m.score.score);
//!     }
//! }
//! for skipped in &result.diagnostics.skipped {
//!     println!("record {} skipped: {}", skipped.index, skipped.reason);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`catalog`]: Cached categorical fusion collections and indexing
//! - [`core`]: Structural elements and fusion records
//! - [`matching`]: Matching engine, scoring and batch matching
//! - [`parsing`]: Loaders for fusion record files
//! - [`cli`]: Command-line interface implementation

pub mod catalog;
pub mod cli;
pub mod core;
pub mod matching;
pub mod parsing;
pub mod utils;

// Re-export commonly used types for convenience
pub use catalog::store::FusionCatalog;
pub use core::element::{Gene, StructuralElement, TranscriptSegment};
pub use core::fusion::{AssayedFusion, CategoricalFusion, FusionStructure};
pub use core::types::*;
pub use matching::batch::{BatchMatcher, BatchResult};
pub use matching::engine::{MatchResult, MatchingConfig, MatchingEngine};
pub use matching::scoring::{MatchScore, ScoreScale};
