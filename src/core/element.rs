use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::{GeneId, Strand};
use crate::utils::validation::{is_valid_curie, normalize_linker_sequence};

/// Raised when a structural element is missing required fields or has contradictory ones
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ElementError {
    #[error("Invalid gene identifier '{0}': expected a CURIE such as hgnc:3190")]
    InvalidGeneId(String),

    #[error("Gene symbol must not be empty")]
    EmptySymbol,

    #[error("Transcript accession must not be empty")]
    EmptyTranscript,

    #[error("Transcript segment sets both exon_start and exon_end")]
    BothJunctions,

    #[error("Transcript segment sets neither exon_start nor exon_end")]
    MissingJunction,

    #[error("exon_{0}_offset given without exon_{0}")]
    OffsetWithoutExon(JunctionSide),

    #[error("genomic_{0} given without exon_{0}")]
    CoordinateWithoutExon(JunctionSide),

    #[error("Exon numbers are 1-based, got 0")]
    ZeroExon,

    #[error("Invalid linker sequence '{0}': only A, C, G, T and N are allowed")]
    InvalidLinker(String),
}

/// A gene reference: stable identifier plus display symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GeneFields")]
pub struct Gene {
    id: GeneId,
    symbol: String,
}

#[derive(Deserialize)]
struct GeneFields {
    id: String,
    symbol: String,
}

impl TryFrom<GeneFields> for Gene {
    type Error = ElementError;

    fn try_from(fields: GeneFields) -> Result<Self, Self::Error> {
        Self::new(fields.id, fields.symbol)
    }
}

impl Gene {
    /// Create a gene reference
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier is not a CURIE or the symbol is empty.
    pub fn new(id: impl Into<String>, symbol: impl Into<String>) -> Result<Self, ElementError> {
        let id = id.into();
        let symbol = symbol.into();
        if !is_valid_curie(&id) {
            return Err(ElementError::InvalidGeneId(id));
        }
        if symbol.trim().is_empty() {
            return Err(ElementError::EmptySymbol);
        }
        Ok(Self {
            id: GeneId::new(id),
            symbol,
        })
    }

    #[must_use]
    pub fn id(&self) -> &GeneId {
        &self.id
    }

    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }
}

impl std::fmt::Display for Gene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.symbol, self.id)
    }
}

/// Resolved genomic position of a breakpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenomicLocation {
    /// Chromosome or contig reference (e.g. `NC_000002.12`)
    pub contig: String,
    /// Base position of the breakpoint
    pub position: u64,
}

impl GenomicLocation {
    pub fn new(contig: impl Into<String>, position: u64) -> Self {
        Self {
            contig: contig.into(),
            position,
        }
    }
}

/// Which side of an exon the junction sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JunctionSide {
    /// Exon start: the segment is the 3' partner of the breakpoint
    Start,
    /// Exon end: the segment is the 5' partner of the breakpoint
    End,
}

impl std::fmt::Display for JunctionSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::End => write!(f, "end"),
        }
    }
}

/// One side of one breakpoint: exon number, intra-exon/intronic offset, genomic coordinate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Junction {
    pub side: JunctionSide,
    pub exon: u32,
    /// Signed offset from the exon boundary; `None` means the offset was not recorded
    pub offset: Option<i32>,
    pub genomic: Option<GenomicLocation>,
}

impl Junction {
    pub fn start(exon: u32) -> Self {
        Self {
            side: JunctionSide::Start,
            exon,
            offset: None,
            genomic: None,
        }
    }

    pub fn end(exon: u32) -> Self {
        Self {
            side: JunctionSide::End,
            exon,
            offset: None,
            genomic: None,
        }
    }

    #[must_use]
    pub fn with_offset(mut self, offset: i32) -> Self {
        self.offset = Some(offset);
        self
    }

    #[must_use]
    pub fn with_genomic(mut self, location: GenomicLocation) -> Self {
        self.genomic = Some(location);
        self
    }

    /// Offset with an unrecorded offset read as the exact exon boundary
    #[must_use]
    pub fn effective_offset(&self) -> i32 {
        self.offset.unwrap_or(0)
    }
}

/// A gene anchored to a transcript, exon and offset at one breakpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TranscriptSegmentFields", into = "TranscriptSegmentFields")]
pub struct TranscriptSegment {
    gene: Gene,
    transcript: String,
    strand: Strand,
    junction: Junction,
}

/// Flat wire form of a transcript segment, one optional field per exon side
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegmentFields {
    pub gene: Gene,
    pub transcript: String,
    pub strand: Strand,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exon_start: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exon_start_offset: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exon_end: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exon_end_offset: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genomic_start: Option<GenomicLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genomic_end: Option<GenomicLocation>,
}

impl TryFrom<TranscriptSegmentFields> for TranscriptSegment {
    type Error = ElementError;

    fn try_from(f: TranscriptSegmentFields) -> Result<Self, Self::Error> {
        if f.exon_start.is_none() && f.exon_start_offset.is_some() {
            return Err(ElementError::OffsetWithoutExon(JunctionSide::Start));
        }
        if f.exon_end.is_none() && f.exon_end_offset.is_some() {
            return Err(ElementError::OffsetWithoutExon(JunctionSide::End));
        }
        if f.exon_start.is_none() && f.genomic_start.is_some() {
            return Err(ElementError::CoordinateWithoutExon(JunctionSide::Start));
        }
        if f.exon_end.is_none() && f.genomic_end.is_some() {
            return Err(ElementError::CoordinateWithoutExon(JunctionSide::End));
        }

        let junction = match (f.exon_start, f.exon_end) {
            (Some(_), Some(_)) => return Err(ElementError::BothJunctions),
            (None, None) => return Err(ElementError::MissingJunction),
            (Some(exon), None) => Junction {
                side: JunctionSide::Start,
                exon,
                offset: f.exon_start_offset,
                genomic: f.genomic_start,
            },
            (None, Some(exon)) => Junction {
                side: JunctionSide::End,
                exon,
                offset: f.exon_end_offset,
                genomic: f.genomic_end,
            },
        };

        Self::new(f.gene, f.transcript, f.strand, junction)
    }
}

impl From<TranscriptSegment> for TranscriptSegmentFields {
    fn from(segment: TranscriptSegment) -> Self {
        let mut fields = Self {
            gene: segment.gene,
            transcript: segment.transcript,
            strand: segment.strand,
            exon_start: None,
            exon_start_offset: None,
            exon_end: None,
            exon_end_offset: None,
            genomic_start: None,
            genomic_end: None,
        };
        let junction = segment.junction;
        match junction.side {
            JunctionSide::Start => {
                fields.exon_start = Some(junction.exon);
                fields.exon_start_offset = junction.offset;
                fields.genomic_start = junction.genomic;
            }
            JunctionSide::End => {
                fields.exon_end = Some(junction.exon);
                fields.exon_end_offset = junction.offset;
                fields.genomic_end = junction.genomic;
            }
        }
        fields
    }
}

impl TranscriptSegment {
    /// Create a transcript segment
    ///
    /// # Errors
    ///
    /// Returns an error if the transcript accession is empty or the exon number is 0.
    pub fn new(
        gene: Gene,
        transcript: impl Into<String>,
        strand: Strand,
        junction: Junction,
    ) -> Result<Self, ElementError> {
        let transcript = transcript.into();
        if transcript.trim().is_empty() {
            return Err(ElementError::EmptyTranscript);
        }
        if junction.exon == 0 {
            return Err(ElementError::ZeroExon);
        }
        Ok(Self {
            gene,
            transcript,
            strand,
            junction,
        })
    }

    #[must_use]
    pub fn gene(&self) -> &Gene {
        &self.gene
    }

    #[must_use]
    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    #[must_use]
    pub fn strand(&self) -> Strand {
        self.strand
    }

    #[must_use]
    pub fn junction(&self) -> &Junction {
        &self.junction
    }
}

impl std::fmt::Display for TranscriptSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}({}):e.{}",
            self.transcript,
            self.gene.symbol(),
            self.junction.exon
        )?;
        match self.junction.effective_offset() {
            0 => Ok(()),
            offset if offset > 0 => write!(f, "+{offset}"),
            offset => write!(f, "{offset}"),
        }
    }
}

/// Literal nucleotide sequence joining two partners, stored uppercase
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LinkerSequence(String);

impl LinkerSequence {
    /// Create a linker sequence
    ///
    /// # Errors
    ///
    /// Returns an error if the sequence is empty or holds non-nucleotide characters.
    pub fn new(sequence: &str) -> Result<Self, ElementError> {
        normalize_linker_sequence(sequence)
            .map(Self)
            .ok_or_else(|| ElementError::InvalidLinker(sequence.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for LinkerSequence {
    type Error = ElementError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<LinkerSequence> for String {
    fn from(linker: LinkerSequence) -> Self {
        linker.0
    }
}

/// Identity of the partner an element stands for, used in all gene-level comparisons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartnerIdentity<'a> {
    /// A specific gene, by stable identifier
    Gene(&'a GeneId),
    /// Any of a set of genes (the `v` wildcard)
    AnyGene,
    /// A partner that is specifically unknown
    UnknownGene,
}

/// One ordered part of a fusion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StructuralElement {
    #[serde(rename = "GeneElement")]
    Gene { gene: Gene },

    #[serde(rename = "TranscriptSegmentElement")]
    TranscriptSegment(TranscriptSegment),

    #[serde(rename = "LinkerSequenceElement")]
    Linker { sequence: LinkerSequence },

    #[serde(rename = "MultiplePossibleGenesElement")]
    MultiplePossibleGenes,

    #[serde(rename = "UnknownGeneElement")]
    UnknownGene,
}

impl StructuralElement {
    pub fn gene(gene: Gene) -> Self {
        Self::Gene { gene }
    }

    /// Create a linker element
    ///
    /// # Errors
    ///
    /// Returns an error if the sequence is not a valid nucleotide sequence.
    pub fn linker(sequence: &str) -> Result<Self, ElementError> {
        Ok(Self::Linker {
            sequence: LinkerSequence::new(sequence)?,
        })
    }

    /// Partner identity of this element; `None` for linkers, which are not partners
    #[must_use]
    pub fn partner_identity(&self) -> Option<PartnerIdentity<'_>> {
        match self {
            Self::Gene { gene } => Some(PartnerIdentity::Gene(gene.id())),
            Self::TranscriptSegment(segment) => Some(PartnerIdentity::Gene(segment.gene().id())),
            Self::MultiplePossibleGenes => Some(PartnerIdentity::AnyGene),
            Self::UnknownGene => Some(PartnerIdentity::UnknownGene),
            Self::Linker { .. } => None,
        }
    }

    #[must_use]
    pub fn is_linker(&self) -> bool {
        matches!(self, Self::Linker { .. })
    }

    /// Short name of the element kind, as used in the serialized `type` tag
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Gene { .. } => "GeneElement",
            Self::TranscriptSegment(_) => "TranscriptSegmentElement",
            Self::Linker { .. } => "LinkerSequenceElement",
            Self::MultiplePossibleGenes => "MultiplePossibleGenesElement",
            Self::UnknownGene => "UnknownGeneElement",
        }
    }
}

impl From<TranscriptSegment> for StructuralElement {
    fn from(segment: TranscriptSegment) -> Self {
        Self::TranscriptSegment(segment)
    }
}

impl std::fmt::Display for StructuralElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gene { gene } => write!(f, "{gene}"),
            Self::TranscriptSegment(segment) => write!(f, "{segment}"),
            Self::Linker { sequence } => write!(f, "{}", sequence.as_str()),
            Self::MultiplePossibleGenes => write!(f, "v"),
            Self::UnknownGene => write!(f, "?"),
        }
    }
}
