//! Application configuration

use std::env;

use uuid::Uuid;

/// Application configuration
pub struct AppConfig {
    /// API port
    pub port: u16,
    /// Database URL
    pub database_url: Option<String>,
    /// Session lifetime in hours
    pub session_ttl_hours: i64,
    /// Admin API key (managed-session credential strategy)
    pub admin_api_key: Option<String>,
    /// User ID admin sessions are issued for
    pub admin_user_id: Uuid,
    /// Email address receipts for admin sessions go to
    pub admin_email: Option<String>,
    /// Transactional email API endpoint
    pub mail_api_url: Option<String>,
    /// Transactional email API key
    pub mail_api_key: Option<String>,
    /// Sender address for outbound mail
    pub mail_from: String,
    /// Optional operator BCC on transfer receipts
    pub mail_operator_bcc: Option<String>,
}

impl AppConfig {
    /// Create a new configuration from environment variables
    pub fn new() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            database_url: env::var("DATABASE_URL").ok(),
            session_ttl_hours: env::var("SESSION_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(24),
            admin_api_key: env::var("ADMIN_API_KEY").ok(),
            admin_user_id: env::var("ADMIN_USER_ID")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(Uuid::new_v4),
            admin_email: env::var("ADMIN_EMAIL").ok(),
            mail_api_url: env::var("MAIL_API_URL").ok(),
            mail_api_key: env::var("MAIL_API_KEY").ok(),
            mail_from: env::var("MAIL_FROM")
                .unwrap_or_else(|_| "no-reply@tradedesk.local".to_string()),
            mail_operator_bcc: env::var("MAIL_OPERATOR_BCC").ok(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}
