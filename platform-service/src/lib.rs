//! Platform service for notifications, global trading state, and market hours

pub mod clock;
pub mod config;
pub mod repository;
pub mod service;

pub use clock::{market_countdown, MarketCountdown};
pub use config::PlatformServiceConfig;
pub use repository::{InMemoryPlatformRepository, PlatformRepository, PostgresPlatformRepository};
pub use service::{PlatformService, RepositoryType};
