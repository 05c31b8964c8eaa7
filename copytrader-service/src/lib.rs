//! Copytrader service for managing followed-trader profiles and settings

pub mod auth;
pub mod config;
pub mod repository;
pub mod service;

pub use config::CopytraderServiceConfig;
pub use repository::{CopytraderRepository, InMemoryCopytraderRepository, PostgresCopytraderRepository};
pub use service::{CopytraderService, NewCopytrader, RepositoryType, SettingsUpdate, UpdateCopytrader};
