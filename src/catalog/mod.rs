//! Cached categorical fusion collections and indexing.
//!
//! Knowledgebase harvesters write one collection file per knowledgebase into a
//! cache directory. Each file holds the knowledgebase name, a creation
//! timestamp and the categorical fusions as JSON; `.json.gz` files are read
//! through gzip. Records that fail validation are dropped with a warning.
//!
//! The catalog indexes fusions by their (5', 3') partner pair so a batch run only
//! compares an assayed fusion against categorical fusions that share its genes or
//! use a wildcard partner.
//!
//! ## Cache Directory
//!
//! Resolved in order:
//!
//! - `$FUSION_MATCHER_DIR`
//! - `fusion-matcher` under the platform data directory (`dirs::data_dir`)
//!
//! ## Example
//!
//! ```rust,no_run
//! use fusion_matcher::FusionCatalog;
//! use fusion_matcher::catalog::store::default_cache_dir;
//!
//! let dir = default_cache_dir().unwrap();
//! let catalog = FusionCatalog::load_cache_dir(&dir).unwrap();
//!
//! for collection in &catalog.collections {
//!     println!("{}: {} fusions", collection.knowledgebase, collection.fusions);
//! }
//! ```

pub mod index;
pub mod store;
