//! Utility functions for the Solr search repository.

use uuid::Uuid;

use crate::errors::SearchBackendError;

/// Length of generated site hashes.
const SITE_HASH_LEN: usize = 6;

/// Generate a random site hash.
///
/// The site hash is stored with every document so several sites (or test
/// runs) can share one Solr core without seeing each other's items.
pub fn generate_site_hash() -> String {
    Uuid::new_v4().simple().to_string()[..SITE_HASH_LEN].to_string()
}

/// Derive a stable site hash from a seed such as the core URL.
///
/// # Example
///
/// ```
/// use solr_search_repository::utils::derive_site_hash;
///
/// let hash = derive_site_hash("http://localhost:8983/solr/d8");
/// assert_eq!(hash.len(), 6);
/// assert_eq!(hash, derive_site_hash("http://localhost:8983/solr/d8"));
/// ```
pub fn derive_site_hash(seed: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, seed.as_bytes())
        .simple()
        .to_string()[..SITE_HASH_LEN]
        .to_string()
}

/// Build the unique Solr document ID of an item: `{site_hash}-{index_id}-{item_id}`.
pub fn solr_document_id(site_hash: &str, index_id: &str, item_id: &str) -> String {
    format!("{}-{}-{}", site_hash, index_id, item_id)
}

/// Validate an item ID handed in for indexing or deletion.
pub fn validate_item_id(item_id: &str) -> Result<(), SearchBackendError> {
    if item_id.trim().is_empty() {
        return Err(SearchBackendError::validation("Item ID cannot be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_site_hash() {
        let first = generate_site_hash();
        let second = generate_site_hash();
        assert_eq!(first.len(), SITE_HASH_LEN);
        assert!(first.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(first, second);
    }

    #[test]
    fn test_derive_site_hash_is_stable_uuid_prefix() {
        let hash = derive_site_hash("http://localhost:8983/solr/d8");
        let expected = Uuid::new_v5(&Uuid::NAMESPACE_URL, b"http://localhost:8983/solr/d8")
            .simple()
            .to_string();

        assert_eq!(hash.len(), SITE_HASH_LEN);
        assert!(expected.starts_with(&hash));
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash, derive_site_hash("http://localhost:8983/solr/d8"));
    }

    #[test]
    fn test_derive_site_hash_differs_per_seed() {
        assert_ne!(
            derive_site_hash("http://localhost:8983/solr/d8"),
            derive_site_hash("http://localhost:8983/solr/d7")
        );
    }

    #[test]
    fn test_solr_document_id() {
        assert_eq!(
            solr_document_id("abc123", "solr_search_index", "5"),
            "abc123-solr_search_index-5"
        );
    }

    #[test]
    fn test_validate_item_id() {
        assert!(validate_item_id("1").is_ok());
        assert!(matches!(
            validate_item_id("  "),
            Err(SearchBackendError::ValidationError(_))
        ));
    }
}
