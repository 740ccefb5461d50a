use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::index::PartnerSlot;
use crate::core::fusion::CategoricalFusion;
use crate::parsing::records::{parse_records, read_text, ParseError};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse catalog: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error(transparent)]
    Records(#[from] ParseError),

    #[error("Knowledgebase name must not be empty")]
    MissingKnowledgebase,
}

/// Catalog version for compatibility checking
pub const CATALOG_VERSION: &str = "1.0.0";

/// Environment variable overriding the cache directory
pub const CACHE_DIR_ENV: &str = "FUSION_MATCHER_DIR";

/// Serializable collection format, one knowledgebase per file
///
/// Fusions are kept as raw JSON so each record can be validated on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogData {
    pub version: String,
    pub created_at: String,
    pub knowledgebase: String,
    pub fusions: Vec<serde_json::Value>,
}

/// Where a collection came from and how much of it loaded
#[derive(Debug, Clone, Serialize)]
pub struct CollectionSummary {
    pub knowledgebase: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    pub fusions: usize,
    pub dropped: usize,
}

/// Categorical fusions from one or more knowledgebases, with indexes
#[derive(Debug, Default)]
pub struct FusionCatalog {
    /// All categorical fusions, in load order
    pub fusions: Vec<CategoricalFusion>,

    /// Collection each fusion was loaded from (index into `collections`)
    collection_of: Vec<usize>,

    /// Loaded collections
    pub collections: Vec<CollectionSummary>,

    /// Index: fusion ID -> index in fusions vec (first occurrence wins)
    id_to_index: HashMap<String, usize>,

    /// Index: (5' slot, 3' slot) -> indices of fusions with those partners
    pub(crate) partner_pair_to_fusions: HashMap<(PartnerSlot, PartnerSlot), Vec<usize>>,

    /// Fusions whose boundaries could not be indexed
    pub(crate) unindexed: Vec<usize>,
}

impl FusionCatalog {
    /// Create an empty catalog
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from already validated fusions
    #[must_use]
    pub fn from_fusions(knowledgebase: &str, fusions: Vec<CategoricalFusion>) -> Self {
        let mut catalog = Self::new();
        let collection = catalog.push_collection(CollectionSummary {
            knowledgebase: knowledgebase.to_string(),
            source: None,
            created_at: None,
            fusions: fusions.len(),
            dropped: 0,
        });
        for fusion in fusions {
            catalog.add_fusion(fusion, collection);
        }
        catalog
    }

    /// Load a single collection file (`.json` or `.json.gz`)
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a collection.
    pub fn load_from_file(path: &Path) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        catalog.add_file(path)?;
        Ok(catalog)
    }

    /// Parse a single collection from JSON
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is not a collection.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        catalog.add_collection(serde_json::from_str(json)?, None)?;
        Ok(catalog)
    }

    /// Load every `*.json` and `*.json.gz` collection in a directory, in file-name order
    ///
    /// Files that fail to load are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed.
    pub fn load_cache_dir(dir: &Path) -> Result<Self, CatalogError> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_collection_file(path))
            .collect();
        paths.sort();

        let mut catalog = Self::new();
        for path in &paths {
            if let Err(e) = catalog.add_file(path) {
                warn!("Skipping cached collection {}: {e}", path.display());
            }
        }

        info!(
            "Loaded {} categorical fusions from {} collection(s) in {}",
            catalog.len(),
            catalog.collections.len(),
            dir.display()
        );
        Ok(catalog)
    }

    /// Add the collection stored in a file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a collection.
    pub fn add_file(&mut self, path: &Path) -> Result<&CollectionSummary, CatalogError> {
        let content = read_text(path)?;
        let data: CatalogData = serde_json::from_str(&content)?;
        self.add_collection(data, Some(path.to_path_buf()))
    }

    /// Add a collection, dropping records that fail validation
    ///
    /// # Errors
    ///
    /// Returns an error if the knowledgebase name is empty or the collection
    /// exceeds the record limit.
    pub fn add_collection(
        &mut self,
        data: CatalogData,
        source: Option<PathBuf>,
    ) -> Result<&CollectionSummary, CatalogError> {
        if data.knowledgebase.trim().is_empty() {
            return Err(CatalogError::MissingKnowledgebase);
        }

        // Version check (warn but don't fail)
        if data.version != CATALOG_VERSION {
            warn!(
                "Catalog version mismatch for {} (expected {CATALOG_VERSION}, found {})",
                data.knowledgebase, data.version
            );
        }

        let kind = format!("{} categorical fusion", data.knowledgebase);
        let records = parse_records::<CategoricalFusion>(data.fusions, &kind)?;

        let collection = self.push_collection(CollectionSummary {
            knowledgebase: data.knowledgebase,
            source,
            created_at: Some(data.created_at),
            fusions: records.records.len(),
            dropped: records.dropped.len(),
        });
        for fusion in records.records {
            self.add_fusion(fusion, collection);
        }

        Ok(&self.collections[collection])
    }

    fn push_collection(&mut self, summary: CollectionSummary) -> usize {
        self.collections.push(summary);
        self.collections.len() - 1
    }

    fn add_fusion(&mut self, fusion: CategoricalFusion, collection: usize) {
        let index = self.fusions.len();

        if let Some(id) = fusion.id() {
            self.id_to_index.entry(id.to_string()).or_insert(index);
        }

        let slots = fusion.structure().boundaries().ok().and_then(|b| {
            Some((
                PartnerSlot::for_categorical(b.five_prime)?,
                PartnerSlot::for_categorical(b.three_prime)?,
            ))
        });
        match slots {
            Some(key) => self.partner_pair_to_fusions.entry(key).or_default().push(index),
            None => {
                debug!("Fusion {} could not be indexed by partner", fusion.label());
                self.unindexed.push(index);
            }
        }

        self.fusions.push(fusion);
        self.collection_of.push(collection);
    }

    /// Get a fusion by position
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&CategoricalFusion> {
        self.fusions.get(index)
    }

    /// Position of the first fusion with this ID
    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.id_to_index.get(id).copied()
    }

    /// Knowledgebase a fusion was loaded from
    #[must_use]
    pub fn knowledgebase(&self, index: usize) -> Option<&str> {
        self.collection_of
            .get(index)
            .map(|&c| self.collections[c].knowledgebase.as_str())
    }

    /// Export the fusions of one knowledgebase as a collection
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self, knowledgebase: &str) -> Result<String, CatalogError> {
        let fusions = self
            .fusions
            .iter()
            .enumerate()
            .filter(|(i, _)| self.knowledgebase(*i) == Some(knowledgebase))
            .map(|(_, fusion)| serde_json::to_value(fusion))
            .collect::<Result<Vec<_>, _>>()?;

        let data = CatalogData {
            version: CATALOG_VERSION.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            knowledgebase: knowledgebase.to_string(),
            fusions,
        };
        Ok(serde_json::to_string_pretty(&data)?)
    }

    /// Number of fusions in catalog
    #[must_use]
    pub fn len(&self) -> usize {
        self.fusions.len()
    }

    /// Check if catalog is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fusions.is_empty()
    }
}

fn is_collection_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(".json") || n.ends_with(".json.gz"))
}

/// Default location of cached collections
///
/// `$FUSION_MATCHER_DIR` when set, else `fusion-matcher` under the platform data
/// directory (`$XDG_DATA_HOME` or `~/.local/share` on Linux).
#[must_use]
pub fn default_cache_dir() -> Option<PathBuf> {
    resolve_cache_dir(std::env::var_os(CACHE_DIR_ENV), dirs::data_dir())
}

fn resolve_cache_dir(
    override_dir: Option<OsString>,
    data_dir: Option<PathBuf>,
) -> Option<PathBuf> {
    match override_dir.filter(|dir| !dir.is_empty()) {
        Some(dir) => Some(PathBuf::from(dir)),
        None => data_dir.map(|dir| dir.join("fusion-matcher")),
    }
}
