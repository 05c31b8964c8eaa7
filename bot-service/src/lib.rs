//! Bot service for managing trading and contract bots

pub mod service;
pub mod repository;
pub mod config;

pub use service::BotService;
pub use service::{NewBot, RepositoryType};
pub use repository::{BotRepository, InMemoryBotRepository, PostgresBotRepository};
pub use config::BotServiceConfig;
