use crate::core::element::{PartnerIdentity, StructuralElement};
use crate::core::fusion::AssayedFusion;
use crate::core::types::GeneId;

use super::store::FusionCatalog;

/// What a categorical fusion requires at one boundary, as an index key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PartnerSlot {
    Gene(GeneId),
    /// The "any gene" wildcard
    Any,
}

impl PartnerSlot {
    /// Slot for a categorical boundary element; `None` if the element cannot be indexed
    #[must_use]
    pub fn for_categorical(element: &StructuralElement) -> Option<Self> {
        match element.partner_identity()? {
            PartnerIdentity::Gene(id) => Some(Self::Gene(id.clone())),
            PartnerIdentity::AnyGene => Some(Self::Any),
            PartnerIdentity::UnknownGene => None,
        }
    }

    /// Slots a categorical boundary may hold and still accept this assayed element
    fn compatible_with(element: &StructuralElement) -> Vec<Self> {
        match element.partner_identity() {
            Some(PartnerIdentity::Gene(id)) => vec![Self::Gene(id.clone()), Self::Any],
            _ => vec![Self::Any],
        }
    }
}

/// Finds categorical fusions that might match an assayed fusion
pub struct CandidateFinder<'a> {
    catalog: &'a FusionCatalog,
}

impl<'a> CandidateFinder<'a> {
    pub fn new(catalog: &'a FusionCatalog) -> Self {
        Self { catalog }
    }

    /// Catalog indices worth comparing against `assayed`, in catalog order
    ///
    /// A categorical fusion is left out only when its partner genes rule it out;
    /// entries that could not be indexed are always returned so the engine can
    /// report them.
    #[must_use]
    pub fn find_candidates(&self, assayed: &AssayedFusion) -> Vec<usize> {
        let Ok(boundaries) = assayed.structure().boundaries() else {
            return (0..self.catalog.len()).collect();
        };

        let five_prime = PartnerSlot::compatible_with(boundaries.five_prime);
        let three_prime = PartnerSlot::compatible_with(boundaries.three_prime);

        let mut candidates: Vec<usize> = self.catalog.unindexed.clone();
        for five in &five_prime {
            for three in &three_prime {
                if let Some(indices) = self
                    .catalog
                    .partner_pair_to_fusions
                    .get(&(five.clone(), three.clone()))
                {
                    candidates.extend_from_slice(indices);
                }
            }
        }

        candidates.sort_unstable();
        candidates.dedup();
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::element::Gene;
    use crate::core::fusion::CategoricalFusion;

    fn gene(id: &str, symbol: &str) -> StructuralElement {
        StructuralElement::gene(Gene::new(id, symbol).unwrap())
    }

    fn catalog() -> FusionCatalog {
        let fusions = vec![
            CategoricalFusion::new(vec![gene("hgnc:3190", "EML4"), gene("hgnc:427", "ALK")]).unwrap(),
            CategoricalFusion::new(vec![gene("hgnc:1014", "BCR"), gene("hgnc:76", "ABL1")]).unwrap(),
            CategoricalFusion::new(vec![StructuralElement::MultiplePossibleGenes, gene("hgnc:427", "ALK")])
                .unwrap(),
            CategoricalFusion::new(vec![
                StructuralElement::MultiplePossibleGenes,
                StructuralElement::MultiplePossibleGenes,
            ])
            .unwrap(),
        ];
        FusionCatalog::from_fusions("test", fusions)
    }

    #[test]
    fn test_find_candidates_by_partner_pair() {
        let catalog = catalog();
        let finder = CandidateFinder::new(&catalog);

        let assayed =
            AssayedFusion::new(vec![gene("hgnc:3190", "EML4"), gene("hgnc:427", "ALK")]).unwrap();
        assert_eq!(finder.find_candidates(&assayed), vec![0, 2, 3]);

        let assayed =
            AssayedFusion::new(vec![gene("hgnc:1014", "BCR"), gene("hgnc:76", "ABL1")]).unwrap();
        assert_eq!(finder.find_candidates(&assayed), vec![1, 3]);
    }

    #[test]
    fn test_unknown_partner_only_reaches_wildcards() {
        let catalog = catalog();
        let finder = CandidateFinder::new(&catalog);

        let assayed =
            AssayedFusion::new(vec![StructuralElement::UnknownGene, gene("hgnc:427", "ALK")]).unwrap();
        assert_eq!(finder.find_candidates(&assayed), vec![2, 3]);
    }
}
