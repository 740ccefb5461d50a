//! Centralized validation and helper functions.

/// Maximum number of structural elements allowed in a single fusion
pub const MAX_STRUCTURAL_ELEMENTS: usize = 64;

/// Maximum number of records accepted from a single input file (DOS protection)
pub const MAX_RECORDS: usize = 1_000_000;

/// Nucleotide codes permitted in a linker sequence
const LINKER_BASES: &[char] = &['A', 'C', 'G', 'T', 'N'];

/// Validate that a string is a compact URI (`prefix:local`).
///
/// # Examples
///
/// ```
/// use fusion_matcher::utils::validation::is_valid_curie;
///
/// assert!(is_valid_curie("hgnc:3190"));
/// assert!(is_valid_curie("refseq:NM_019063.5"));
/// assert!(!is_valid_curie("EML4"));
/// assert!(!is_valid_curie("hgnc:"));
/// ```
#[must_use]
pub fn is_valid_curie(s: &str) -> bool {
    match s.split_once(':') {
        Some((prefix, local)) => {
            !prefix.is_empty()
                && !local.is_empty()
                && prefix
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-')
                && !local.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

/// Normalize a linker sequence to uppercase.
/// Returns None if the input is empty or contains anything other than A, C, G, T or N.
#[must_use]
pub fn normalize_linker_sequence(s: &str) -> Option<String> {
    let upper = s.trim().to_ascii_uppercase();
    if upper.is_empty() || !upper.chars().all(|c| LINKER_BASES.contains(&c)) {
        None
    } else {
        Some(upper)
    }
}

/// Check if adding another record would exceed the maximum allowed.
///
/// Call this with the current count BEFORE adding a new record.
/// Returns an error message if adding would exceed the limit, None if safe to add.
#[must_use]
pub fn check_record_limit(count: usize) -> Option<String> {
    if count >= MAX_RECORDS {
        Some(format!(
            "Too many records: adding another would exceed maximum of {MAX_RECORDS}"
        ))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_curie() {
        assert!(is_valid_curie("hgnc:427"));
        assert!(is_valid_curie("ensembl:ENSG00000171094"));
        assert!(!is_valid_curie(""));
        assert!(!is_valid_curie(":427"));
        assert!(!is_valid_curie("hgnc:4 27"));
        assert!(!is_valid_curie("hg nc:427"));
    }

    #[test]
    fn test_normalize_linker_sequence() {
        assert_eq!(normalize_linker_sequence("acgt"), Some("ACGT".to_string()));
        assert_eq!(normalize_linker_sequence("TTN"), Some("TTN".to_string()));
        assert_eq!(normalize_linker_sequence(""), None);
        assert_eq!(normalize_linker_sequence("ACGU"), None);
        assert_eq!(normalize_linker_sequence("AC-GT"), None);
    }

    #[test]
    fn test_check_record_limit() {
        assert!(check_record_limit(0).is_none());
        assert!(check_record_limit(MAX_RECORDS - 1).is_none());
        assert!(check_record_limit(MAX_RECORDS).is_some());
    }
}
