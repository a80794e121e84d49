//! Staleness decisions for cached entries

use std::time::Duration;

/// Decides when a cached entry counts as stale
///
/// Both the background sweep and [`ResponseCache::get`](super::ResponseCache::get)
/// ask the policy, so switching policies never requires touching callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpiryPolicy {
    /// Entries are only removed by the periodic sweep. Lookups return whatever
    /// the last sweep left behind, even if it has aged past the TTL since.
    #[default]
    SweepOnly,
    /// Lookups also hide entries that have reached the TTL but have not been
    /// swept yet.
    CheckOnRead,
}

impl ExpiryPolicy {
    /// Returns true if an entry of the given age has reached the TTL
    pub fn is_stale(self, age: Duration, ttl: Duration) -> bool {
        age >= ttl
    }

    /// Returns true if a lookup should treat an entry of this age as missing
    pub fn hides_on_read(self, age: Duration, ttl: Duration) -> bool {
        match self {
            ExpiryPolicy::SweepOnly => false,
            ExpiryPolicy::CheckOnRead => self.is_stale(age, ttl),
        }
    }
}
