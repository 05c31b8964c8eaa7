// api-gateway/src/lib.rs
pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod mailer;
pub mod ws;

use std::sync::Arc;

use bot_service::BotService;
use copytrader_service::CopytraderService;
use ledger_service::LedgerService;
use platform_service::PlatformService;
use view_cache::ViewCache;

use crate::auth::SessionStore;
use crate::config::AppConfig;
use crate::mailer::Mailer;

/// App state shared across handlers
pub struct AppState {
    /// Bot service
    pub bot_service: Arc<BotService>,
    /// Copytrader service
    pub copytrader_service: Arc<CopytraderService>,
    /// Ledger service
    pub ledger_service: Arc<LedgerService>,
    /// Platform service
    pub platform_service: Arc<PlatformService>,
    /// Read-through cache for list views
    pub cache: Arc<ViewCache>,
    /// Issued bearer sessions
    pub sessions: SessionStore,
    /// Outbound mail client
    pub mailer: Mailer,
    /// Application configuration
    pub config: AppConfig,
}
