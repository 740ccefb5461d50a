//! Core data types for gene fusion matching.
//!
//! This module provides the fundamental types used throughout the library:
//!
//! - [`StructuralElement`]: One ordered part of a fusion (gene, transcript segment,
//!   linker, wildcard, or unknown partner)
//! - [`FusionStructure`]: A validated sequence of structural elements
//! - [`AssayedFusion`]: A fusion observed in a patient sample
//! - [`CategoricalFusion`]: A generalized fusion pattern from a knowledgebase
//! - [`GeneId`], [`Strand`], [`MatchTier`]: Identifiers and classification types
//!
//! ## Partner identity
//!
//! Every partner element resolves to a [`PartnerIdentity`]:
//!
//! | Element | Identity | Shorthand |
//! |---------|----------|-----------|
//! | `GeneElement` | gene id | `EML4(hgnc:3190)` |
//! | `TranscriptSegmentElement` | gene id | `NM_019063.5(EML4):e.13` |
//! | `MultiplePossibleGenesElement` | any gene | `v` |
//! | `UnknownGeneElement` | unknown gene | `?` |
//!
//! Gene comparisons use the **stable identifier** only; symbols are for display.
//!
//! [`StructuralElement`]: element::StructuralElement
//! [`PartnerIdentity`]: element::PartnerIdentity
//! [`FusionStructure`]: fusion::FusionStructure
//! [`AssayedFusion`]: fusion::AssayedFusion
//! [`CategoricalFusion`]: fusion::CategoricalFusion
//! [`GeneId`]: types::GeneId
//! [`Strand`]: types::Strand
//! [`MatchTier`]: types::MatchTier

pub mod element;
pub mod fusion;
pub mod types;
