//! Error types for the admin backend
//!
//! This module provides a unified error handling system for all service
//! crates in the platform. It defines standard error types that can be used
//! across service boundaries and provides consistent error conversion.

use std::fmt::Display;
use thiserror::Error;

/// Platform error type
#[derive(Debug, Error)]
pub enum Error {
    /// Error when a bot cannot be found (or is owned by someone else)
    #[error("Bot not found: {0}")]
    BotNotFound(String),

    /// Error when a copytrader profile cannot be found
    #[error("Copytrader not found: {0}")]
    CopytraderNotFound(String),

    /// Error when a notification cannot be found
    #[error("Notification not found: {0}")]
    NotificationNotFound(String),

    /// Generic validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Authentication error (missing or expired session)
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// Authorization error
    #[error("Authorization error: {0}")]
    AuthorizationError(String),

    /// Outbound mail delivery error
    #[error("Mail delivery error: {0}")]
    MailDelivery(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Database migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Decimal conversion error
    #[error("Decimal conversion error: {0}")]
    DecimalError(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait to add context to error results
pub trait ErrorExt<T> {
    /// Add context information to an error
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display;
}

impl<T> ErrorExt<T> for Result<T> {
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display,
    {
        self.map_err(|e| {
            let context = context_fn().to_string();
            match e {
                Error::BotNotFound(msg) => Error::BotNotFound(format!("{}: {}", context, msg)),
                Error::CopytraderNotFound(msg) => Error::CopytraderNotFound(format!("{}: {}", context, msg)),
                Error::NotificationNotFound(msg) => Error::NotificationNotFound(format!("{}: {}", context, msg)),
                Error::ValidationError(msg) => Error::ValidationError(format!("{}: {}", context, msg)),
                Error::ConfigurationError(msg) => Error::ConfigurationError(format!("{}: {}", context, msg)),
                Error::AuthenticationError(msg) => Error::AuthenticationError(format!("{}: {}", context, msg)),
                Error::AuthorizationError(msg) => Error::AuthorizationError(format!("{}: {}", context, msg)),
                Error::MailDelivery(msg) => Error::MailDelivery(format!("{}: {}", context, msg)),
                Error::Internal(msg) => Error::Internal(format!("{}: {}", context, msg)),
                Error::DecimalError(msg) => Error::DecimalError(format!("{}: {}", context, msg)),
                Error::Database(e) => Error::Database(e),
                Error::Migration(e) => Error::Migration(e),
                Error::Serialization(e) => Error::Serialization(e),
            }
        })
    }
}

/// Trait for converting other error types to our Error type
pub trait IntoError {
    /// Convert to Error
    fn into_error(self, message: &str) -> Error;
}

impl<E: std::error::Error> IntoError for E {
    fn into_error(self, message: &str) -> Error {
        Error::Internal(format!("{}: {}", message, self))
    }
}

/// Convert string messages into an error
impl From<String> for Error {
    fn from(message: String) -> Self {
        Error::Internal(message)
    }
}

/// Convert static string references into an error
impl From<&str> for Error {
    fn from(message: &str) -> Self {
        Error::Internal(message.to_string())
    }
}

/// From rust_decimal::Error
impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::DecimalError(err.to_string())
    }
}
