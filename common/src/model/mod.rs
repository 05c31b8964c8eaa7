//! Domain models shared across the platform services

pub mod bot;
pub mod copytrader;
pub mod funds;
pub mod notification;
pub mod platform;
pub mod session;
pub mod transfer;
