use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::element::{JunctionSide, LinkerSequence, StructuralElement};
use crate::core::types::{CausativeEvent, FusionEvidence};
use crate::utils::validation::MAX_STRUCTURAL_ELEMENTS;

/// Raised when an element sequence violates the fusion structure invariants
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructureError {
    #[error("Fusion needs at least two partner elements, found {0}")]
    InsufficientPartners(usize),

    #[error("Element {0} is a linker; a fusion cannot start or end with a linker")]
    LinkerAtBoundary(usize),

    #[error("Elements {0} and {1} are consecutive linkers")]
    ConsecutiveLinkers(usize, usize),

    #[error("5' transcript segment must give an exon end position, not an exon start")]
    FivePrimeJunction,

    #[error("3' transcript segment must give an exon start position, not an exon end")]
    ThreePrimeJunction,

    #[error("{element} is not allowed in {fusion} fusions")]
    ElementNotAllowed {
        element: &'static str,
        fusion: FusionKind,
    },

    #[error("Fusion has {0} structural elements, maximum is {MAX_STRUCTURAL_ELEMENTS}")]
    TooManyElements(usize),
}

/// The two fusion record variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FusionKind {
    Assayed,
    Categorical,
}

impl std::fmt::Display for FusionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Assayed => write!(f, "assayed"),
            Self::Categorical => write!(f, "categorical"),
        }
    }
}

/// The 5' and 3' partner elements of a fusion
#[derive(Debug, Clone, Copy)]
pub struct Boundaries<'a> {
    pub five_prime: &'a StructuralElement,
    pub three_prime: &'a StructuralElement,
}

/// Validated, ordered sequence of structural elements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<StructuralElement>", into = "Vec<StructuralElement>")]
pub struct FusionStructure {
    elements: Vec<StructuralElement>,
}

impl FusionStructure {
    /// Validate and wrap an element sequence
    ///
    /// # Errors
    ///
    /// Returns an error if the sequence has fewer than two partners, starts or ends
    /// with a linker, has consecutive linkers, or a boundary segment is on the wrong side.
    pub fn new(elements: Vec<StructuralElement>) -> Result<Self, StructureError> {
        validate_elements(&elements)?;
        Ok(Self { elements })
    }

    #[must_use]
    pub fn elements(&self) -> &[StructuralElement] {
        &self.elements
    }

    /// Number of non-linker elements
    #[must_use]
    pub fn partner_count(&self) -> usize {
        self.elements.iter().filter(|e| !e.is_linker()).count()
    }

    /// First and last non-linker elements
    ///
    /// # Errors
    ///
    /// Returns an error if fewer than two partner elements are present.
    pub fn boundaries(&self) -> Result<Boundaries<'_>, StructureError> {
        let mut partners = self.elements.iter().filter(|e| !e.is_linker());
        let five_prime = partners.next();
        let three_prime = partners.last();
        match (five_prime, three_prime) {
            (Some(five_prime), Some(three_prime)) => Ok(Boundaries {
                five_prime,
                three_prime,
            }),
            _ => Err(StructureError::InsufficientPartners(self.partner_count())),
        }
    }

    /// Linker sequence joining the partners, if any
    #[must_use]
    pub fn linker(&self) -> Option<&LinkerSequence> {
        self.elements.iter().find_map(|e| match e {
            StructuralElement::Linker { sequence } => Some(sequence),
            _ => None,
        })
    }

    fn check_allowed(&self, fusion: FusionKind) -> Result<(), StructureError> {
        let forbidden = self.elements.iter().find(|e| match fusion {
            FusionKind::Assayed => matches!(e, StructuralElement::MultiplePossibleGenes),
            FusionKind::Categorical => matches!(e, StructuralElement::UnknownGene),
        });
        match forbidden {
            Some(element) => Err(StructureError::ElementNotAllowed {
                element: element.kind(),
                fusion,
            }),
            None => Ok(()),
        }
    }
}

impl TryFrom<Vec<StructuralElement>> for FusionStructure {
    type Error = StructureError;

    fn try_from(elements: Vec<StructuralElement>) -> Result<Self, Self::Error> {
        Self::new(elements)
    }
}

impl From<FusionStructure> for Vec<StructuralElement> {
    fn from(structure: FusionStructure) -> Self {
        structure.elements
    }
}

impl std::fmt::Display for FusionStructure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, element) in self.elements.iter().enumerate() {
            if i > 0 {
                write!(f, "::")?;
            }
            write!(f, "{element}")?;
        }
        Ok(())
    }
}

fn validate_elements(elements: &[StructuralElement]) -> Result<(), StructureError> {
    if elements.len() > MAX_STRUCTURAL_ELEMENTS {
        return Err(StructureError::TooManyElements(elements.len()));
    }

    let partners = elements.iter().filter(|e| !e.is_linker()).count();
    if partners < 2 {
        return Err(StructureError::InsufficientPartners(partners));
    }

    if elements.first().is_some_and(StructuralElement::is_linker) {
        return Err(StructureError::LinkerAtBoundary(0));
    }
    if elements.last().is_some_and(StructuralElement::is_linker) {
        return Err(StructureError::LinkerAtBoundary(elements.len() - 1));
    }

    for (i, pair) in elements.windows(2).enumerate() {
        if pair[0].is_linker() && pair[1].is_linker() {
            return Err(StructureError::ConsecutiveLinkers(i, i + 1));
        }
    }

    // Boundaries are the first and last elements once linkers are excluded from the ends
    if let Some(StructuralElement::TranscriptSegment(segment)) = elements.first() {
        if segment.junction().side != JunctionSide::End {
            return Err(StructureError::FivePrimeJunction);
        }
    }
    if let Some(StructuralElement::TranscriptSegment(segment)) = elements.last() {
        if segment.junction().side != JunctionSide::Start {
            return Err(StructureError::ThreePrimeJunction);
        }
    }

    Ok(())
}

/// Assay used to detect a fusion
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MolecularAssay {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assay_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assay_name: Option<String>,

    /// Method reference (e.g. `pmid:34974290`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method_uri: Option<String>,

    /// Evidence & Conclusion Ontology code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eco_id: Option<String>,
}

/// A fusion observed in a patient sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AssayedFusionFields")]
pub struct AssayedFusion {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,

    structure: FusionStructure,

    #[serde(skip_serializing_if = "Option::is_none")]
    assay: Option<MolecularAssay>,

    #[serde(skip_serializing_if = "Option::is_none")]
    evidence: Option<FusionEvidence>,

    #[serde(skip_serializing_if = "Option::is_none")]
    causative_event: Option<CausativeEvent>,
}

#[derive(Deserialize)]
struct AssayedFusionFields {
    #[serde(default)]
    id: Option<String>,
    structure: FusionStructure,
    #[serde(default)]
    assay: Option<MolecularAssay>,
    #[serde(default)]
    evidence: Option<FusionEvidence>,
    #[serde(default)]
    causative_event: Option<CausativeEvent>,
}

impl TryFrom<AssayedFusionFields> for AssayedFusion {
    type Error = StructureError;

    fn try_from(f: AssayedFusionFields) -> Result<Self, Self::Error> {
        let mut fusion = Self::from_structure(f.structure)?;
        fusion.id = f.id;
        fusion.assay = f.assay;
        fusion.evidence = f.evidence;
        fusion.causative_event = f.causative_event;
        Ok(fusion)
    }
}

impl AssayedFusion {
    /// Create an assayed fusion from its elements
    ///
    /// # Errors
    ///
    /// Returns an error if the elements violate the structure invariants or include
    /// a multiple-possible-genes wildcard.
    pub fn new(elements: Vec<StructuralElement>) -> Result<Self, StructureError> {
        Self::from_structure(FusionStructure::new(elements)?)
    }

    /// Create an assayed fusion from an already validated structure
    ///
    /// # Errors
    ///
    /// Returns an error if the structure includes a multiple-possible-genes wildcard.
    pub fn from_structure(structure: FusionStructure) -> Result<Self, StructureError> {
        structure.check_allowed(FusionKind::Assayed)?;
        Ok(Self {
            id: None,
            structure,
            assay: None,
            evidence: None,
            causative_event: None,
        })
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_assay(mut self, assay: MolecularAssay) -> Self {
        self.assay = Some(assay);
        self
    }

    #[must_use]
    pub fn with_evidence(mut self, evidence: FusionEvidence) -> Self {
        self.evidence = Some(evidence);
        self
    }

    #[must_use]
    pub fn with_causative_event(mut self, event: CausativeEvent) -> Self {
        self.causative_event = Some(event);
        self
    }

    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    #[must_use]
    pub fn structure(&self) -> &FusionStructure {
        &self.structure
    }

    #[must_use]
    pub fn assay(&self) -> Option<&MolecularAssay> {
        self.assay.as_ref()
    }

    #[must_use]
    pub fn evidence(&self) -> Option<FusionEvidence> {
        self.evidence
    }

    #[must_use]
    pub fn causative_event(&self) -> Option<CausativeEvent> {
        self.causative_event
    }

    /// Identifier if present, otherwise the shorthand structure
    #[must_use]
    pub fn label(&self) -> String {
        self.id
            .clone()
            .unwrap_or_else(|| self.structure.to_string())
    }
}

/// Cross-reference from a categorical fusion to a knowledgebase record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgebaseXref {
    /// Knowledgebase name (e.g. `CIViC`)
    pub source: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub molecular_profile_id: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence_ids: Vec<String>,

    /// Opaque knowledgebase payload (evidence items, assertions); never inspected here
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub payload: serde_json::Value,
}

impl KnowledgebaseXref {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            molecular_profile_id: None,
            evidence_ids: Vec::new(),
            payload: serde_json::Value::Null,
        }
    }
}

/// A generalized fusion pattern from a curated knowledgebase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CategoricalFusionFields")]
pub struct CategoricalFusion {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,

    structure: FusionStructure,

    #[serde(skip_serializing_if = "Option::is_none")]
    nomenclature: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    reading_frame_preserved: Option<bool>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    xrefs: Vec<KnowledgebaseXref>,
}

#[derive(Deserialize)]
struct CategoricalFusionFields {
    #[serde(default)]
    id: Option<String>,
    structure: FusionStructure,
    #[serde(default)]
    nomenclature: Option<String>,
    #[serde(default)]
    reading_frame_preserved: Option<bool>,
    #[serde(default)]
    xrefs: Vec<KnowledgebaseXref>,
}

impl TryFrom<CategoricalFusionFields> for CategoricalFusion {
    type Error = StructureError;

    fn try_from(f: CategoricalFusionFields) -> Result<Self, Self::Error> {
        let mut fusion = Self::from_structure(f.structure)?;
        fusion.id = f.id;
        fusion.nomenclature = f.nomenclature;
        fusion.reading_frame_preserved = f.reading_frame_preserved;
        fusion.xrefs = f.xrefs;
        Ok(fusion)
    }
}

impl CategoricalFusion {
    /// Create a categorical fusion from its elements
    ///
    /// # Errors
    ///
    /// Returns an error if the elements violate the structure invariants or include
    /// an unknown-gene element.
    pub fn new(elements: Vec<StructuralElement>) -> Result<Self, StructureError> {
        Self::from_structure(FusionStructure::new(elements)?)
    }

    /// Create a categorical fusion from an already validated structure
    ///
    /// # Errors
    ///
    /// Returns an error if the structure includes an unknown-gene element.
    pub fn from_structure(structure: FusionStructure) -> Result<Self, StructureError> {
        structure.check_allowed(FusionKind::Categorical)?;
        Ok(Self {
            id: None,
            structure,
            nomenclature: None,
            reading_frame_preserved: None,
            xrefs: Vec::new(),
        })
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_nomenclature(mut self, nomenclature: impl Into<String>) -> Self {
        self.nomenclature = Some(nomenclature.into());
        self
    }

    #[must_use]
    pub fn with_reading_frame_preserved(mut self, preserved: bool) -> Self {
        self.reading_frame_preserved = Some(preserved);
        self
    }

    #[must_use]
    pub fn with_xref(mut self, xref: KnowledgebaseXref) -> Self {
        self.xrefs.push(xref);
        self
    }

    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    #[must_use]
    pub fn structure(&self) -> &FusionStructure {
        &self.structure
    }

    #[must_use]
    pub fn nomenclature(&self) -> Option<&str> {
        self.nomenclature.as_deref()
    }

    #[must_use]
    pub fn reading_frame_preserved(&self) -> Option<bool> {
        self.reading_frame_preserved
    }

    #[must_use]
    pub fn xrefs(&self) -> &[KnowledgebaseXref] {
        &self.xrefs
    }

    /// Identifier, else nomenclature, else the shorthand structure
    #[must_use]
    pub fn label(&self) -> String {
        self.id
            .clone()
            .or_else(|| self.nomenclature.clone())
            .unwrap_or_else(|| self.structure.to_string())
    }
}
