//! In-memory response cache with time-based expiry
//!
//! This module provides a thread-safe store for raw API response bodies. Entries
//! are removed by a background sweep task that runs once per TTL period, so an
//! entry may outlive its TTL by up to one sweep interval. Whether a lookup may
//! return such an entry is decided by an [`ExpiryPolicy`].

mod policy;
mod response_cache;

pub use policy::ExpiryPolicy;
pub use response_cache::ResponseCache;
