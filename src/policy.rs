use std::time::Duration;

/// Collection views are refreshed on every access.
pub const DEFAULT_COLLECTION_TTL: Duration = Duration::from_secs(5 * 60);
/// Filtered views get a hard deadline: they are cheap to recompute and a fixed
/// expiry bounds staleness predictably.
pub const DEFAULT_FILTERED_TTL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_ENTITY_TTL: Duration = Duration::from_secs(5 * 60);
/// Carts live as long as the session keeps touching them.
pub const DEFAULT_CART_IDLE_TTL: Duration = Duration::from_secs(30 * 60);

/// Expiration policy of a single cache entry.
///
/// `Sliding` resets the clock on every read of the entry; `Absolute` fixes the
/// deadline at write time no matter how often the entry is read. Both restart
/// on overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlPolicy {
    Sliding(Duration),
    Absolute(Duration),
}

impl TtlPolicy {
    #[inline]
    pub fn duration(&self) -> Duration {
        match self {
            Self::Sliding(d) | Self::Absolute(d) => *d,
        }
    }

    #[inline]
    pub fn is_sliding(&self) -> bool {
        matches!(self, Self::Sliding(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_exposes_its_duration() {
        assert_eq!(TtlPolicy::Sliding(Duration::from_secs(7)).duration(), Duration::from_secs(7));
        assert_eq!(TtlPolicy::Absolute(Duration::from_secs(9)).duration(), Duration::from_secs(9));
        assert!(TtlPolicy::Sliding(Duration::ZERO).is_sliding());
        assert!(!TtlPolicy::Absolute(Duration::ZERO).is_sliding());
    }
}
