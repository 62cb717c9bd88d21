//! Keyboard label → catalog category.

use linkcatalog_shared::{CategoryKey, LinkCatalogError, Result};

/// Resolve a user reply to a category.
///
/// Only the exact button labels match. Case variants, labels without the
/// emoji and padded labels are all rejected.
pub fn resolve(label: &str) -> Result<CategoryKey> {
    CategoryKey::ALL
        .into_iter()
        .find(|key| key.label() == label)
        .ok_or_else(|| LinkCatalogError::invalid_category(label))
}
