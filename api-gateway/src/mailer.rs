//! Outbound transfer-receipt email
//!
//! Renders a fixed HTML template and posts it to a transactional-email HTTP
//! API. When no mail endpoint is configured the send is skipped with a log
//! line, so local development needs no mail account.

use askama::Template;
use common::error::{Error, Result};
use common::model::transfer::Transfer;
use tracing::{info, warn};

use crate::config::AppConfig;

/// Transfer receipt template
#[derive(Template)]
#[template(path = "transfer_receipt.html")]
pub struct TransferReceiptTemplate<'a> {
    /// Deposit or withdrawal
    pub direction: &'a str,
    /// Formatted amount
    pub amount: String,
    /// Currency code
    pub currency: &'a str,
    /// Wallet address
    pub wallet_address: &'a str,
    /// Transfer reference
    pub reference: String,
    /// Formatted creation time
    pub created_at: String,
}

/// Transactional email client
pub struct Mailer {
    client: reqwest::Client,
    api_url: Option<String>,
    api_key: Option<String>,
    from: String,
    operator_bcc: Option<String>,
}

impl Mailer {
    /// Create a mailer from application configuration
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.mail_api_url.clone(),
            api_key: config.mail_api_key.clone(),
            from: config.mail_from.clone(),
            operator_bcc: config.mail_operator_bcc.clone(),
        }
    }

    /// Send a transfer receipt to the user's registered address
    pub async fn send_transfer_receipt(&self, to: &str, transfer: &Transfer) -> Result<()> {
        let template = TransferReceiptTemplate {
            direction: transfer.direction.as_str(),
            amount: transfer.amount.to_string(),
            currency: &transfer.currency,
            wallet_address: &transfer.wallet_address,
            reference: transfer.id.to_string(),
            created_at: transfer.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        };

        let html = template
            .render()
            .map_err(|e| Error::Internal(format!("Failed to render receipt template: {}", e)))?;

        let Some(api_url) = &self.api_url else {
            warn!("Mail API not configured, skipping receipt for transfer {}", transfer.id);
            return Ok(());
        };

        let subject = format!(
            "Your {} of {} {}",
            transfer.direction.as_str(),
            transfer.amount,
            transfer.currency
        );

        let mut payload = serde_json::json!({
            "from": self.from,
            "to": to,
            "subject": subject,
            "html": html,
        });
        if let Some(bcc) = &self.operator_bcc {
            payload["bcc"] = serde_json::Value::String(bcc.clone());
        }

        let mut request = self.client.post(api_url).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::MailDelivery(format!("Mail API request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::MailDelivery(format!(
                "Mail API returned {}",
                response.status()
            )));
        }

        info!("Sent {} receipt for transfer {}", transfer.direction.as_str(), transfer.id);
        Ok(())
    }
}
