use std::fmt::Display;

use crate::session::SessionId;

/// Cache slot name, derived deterministically from an entity kind and a
/// selector. Logically equal selectors always normalize to the same key so
/// that population and invalidation target the same slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Slot for the full collection of a kind.
    pub fn all(kind: &str) -> Self {
        Self(format!("{kind}:all"))
    }

    /// Slot for a filtered view. The filter value is case-folded and trimmed
    /// before key construction.
    pub fn filtered(kind: &str, filter: &str) -> Self {
        Self(format!("{kind}:filter:{}", normalize_filter(filter)))
    }

    /// Slot for a single entity.
    pub fn by_id(kind: &str, id: &impl Display) -> Self {
        Self(format!("{kind}:id:{id}"))
    }

    /// Slot for a session's cart collection.
    pub fn session(session: &SessionId) -> Self {
        Self(format!("cart:{session}"))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Filter values arrive user-supplied; equality of selectors must not depend
/// on spelling.
pub(crate) fn normalize_filter(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_formats() {
        assert_eq!(CacheKey::all("products").as_str(), "products:all");
        assert_eq!(CacheKey::by_id("products", &42).as_str(), "products:id:42");
        assert_eq!(CacheKey::session(&SessionId::default()).as_str(), "cart:guest");
    }

    #[test]
    fn equal_selectors_normalize_to_one_slot() {
        let spelled = CacheKey::filtered("products", "Electronics");
        let padded = CacheKey::filtered("products", " electronics ");
        assert_eq!(spelled, padded);
        assert_eq!(spelled.as_str(), "products:filter:electronics");
    }

    #[test]
    fn distinct_filters_stay_distinct() {
        assert_ne!(
            CacheKey::filtered("products", "electronics"),
            CacheKey::filtered("products", "footwear")
        );
    }
}
