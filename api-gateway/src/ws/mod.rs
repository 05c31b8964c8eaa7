//! WebSocket push for cache invalidation events

pub mod handler;
pub mod message;
