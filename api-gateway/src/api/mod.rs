//! API handlers

pub mod auth;
pub mod bots;
pub mod copytraders;
pub mod funds;
pub mod notifications;
pub mod platform;
pub mod response;
pub mod transfers;
