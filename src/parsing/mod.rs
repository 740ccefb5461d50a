//! Loaders for fusion record files.
//!
//! Fusion records arrive as JSON produced by upstream harvesters (fusion callers
//! or knowledgebase exports). Each record is validated on its own: a malformed
//! record is dropped and logged, the rest of the file still loads.
//!
//! ## Example
//!
//! ```rust,no_run
//! use fusion_matcher::parsing::records::parse_assayed_file;
//! use std::path::Path;
//!
//! let set = parse_assayed_file(Path::new("assayed.json")).unwrap();
//! println!("{} fusions, {} dropped", set.records.len(), set.dropped.len());
//! ```
//!
//! Files ending in `.gz` are decompressed on the fly.

pub mod records;
