//! Category types and key normalization.

use serde::{Deserialize, Serialize};

/// Sentinel key treated as "no category" at the API boundary.
pub const UNCATEGORIZED_KEY: &str = "uncategorized";

/// A named tag for elapsed time.
///
/// The `key` is the immutable identity other entities reference; `name`
/// and `color` are display attributes and may change. Categories are
/// never physically deleted, only deactivated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub key: String,
    pub name: String,
    pub color: Option<String>,
    pub is_active: bool,
}

/// Input for creating a category. New categories are always active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub key: String,
    pub name: String,
    pub color: Option<String>,
}

/// Partial update for a category.
///
/// `None` fields are left untouched. For `color`, `Some(None)` is an
/// explicit clear, distinct from "not provided".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub color: Option<Option<String>>,
    pub is_active: Option<bool>,
}

/// Normalizes a category key from the API boundary.
///
/// The empty string and the literal `"uncategorized"` are sentinels for
/// "no category" and map to `None`. Matching is exact and case-sensitive.
pub fn normalize_category_key(key: Option<&str>) -> Option<String> {
    key.filter(|key| !key.is_empty() && *key != UNCATEGORIZED_KEY)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_maps_sentinels_to_none() {
        assert_eq!(normalize_category_key(None), None);
        assert_eq!(normalize_category_key(Some("")), None);
        assert_eq!(normalize_category_key(Some("uncategorized")), None);
    }

    #[test]
    fn normalize_passes_real_keys_through() {
        assert_eq!(
            normalize_category_key(Some("work")),
            Some("work".to_string())
        );
    }

    #[test]
    fn normalize_is_case_sensitive() {
        // Only the exact lowercase literal is a sentinel.
        assert_eq!(
            normalize_category_key(Some("Uncategorized")),
            Some("Uncategorized".to_string())
        );
    }

    #[test]
    fn patch_distinguishes_absent_from_clear() {
        let untouched = CategoryPatch::default();
        assert_eq!(untouched.color, None);

        let cleared = CategoryPatch {
            color: Some(None),
            ..CategoryPatch::default()
        };
        assert_eq!(cleared.color, Some(None));
    }
}
