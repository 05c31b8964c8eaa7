//! Read-through cache for dashboard view data
//!
//! Query results are cached per collection (optionally per sub-key) and
//! dropped on invalidation rather than refreshed in place. Invalidations
//! are also broadcast on a channel so connected clients can refetch.

pub mod cache;
pub mod channel;

pub use cache::{CacheKey, ViewCache};
pub use channel::{InvalidationChannel, InvalidationEvent, Topic};
