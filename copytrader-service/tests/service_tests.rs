//! Tests for the copytrader service

use common::decimal::dec;
use common::error::Error;
use common::model::copytrader::NotifyChannel;
use copytrader_service::{CopytraderService, NewCopytrader, SettingsUpdate, UpdateCopytrader};
use uuid::Uuid;

fn profile(name: &str, email: &str) -> NewCopytrader {
    NewCopytrader {
        display_name: name.to_string(),
        email: email.to_string(),
        phone: None,
        description: None,
    }
}

fn settings(wallet: &str) -> SettingsUpdate {
    SettingsUpdate {
        profit_share_pct: dec!(20),
        budget: dec!(1000),
        payout_wallet: wallet.to_string(),
        notify_channel: NotifyChannel::Email,
        subscription_until: None,
    }
}

#[tokio::test]
async fn test_create_and_get_copytrader() {
    let service = CopytraderService::new();
    let user_id = Uuid::new_v4();

    let created = service
        .create_copytrader(user_id, profile("Alice Trader", "alice@example.com"))
        .await
        .unwrap();

    assert!(created.is_active);
    assert!(created.password_hash.is_none());

    let fetched = service.get_copytrader(user_id, created.id).await.unwrap();
    assert!(fetched.is_some());
    assert_eq!(fetched.unwrap().display_name, "Alice Trader");

    // Another user must not see the profile
    let other = service
        .get_copytrader(Uuid::new_v4(), created.id)
        .await
        .unwrap();
    assert!(other.is_none());
}

#[tokio::test]
async fn test_create_copytrader_validation() {
    let service = CopytraderService::new();
    let user_id = Uuid::new_v4();

    let result = service
        .create_copytrader(user_id, profile("", "alice@example.com"))
        .await;
    assert!(matches!(result, Err(Error::ValidationError(_))));

    let result = service
        .create_copytrader(user_id, profile("Alice", "not-an-email"))
        .await;
    assert!(matches!(result, Err(Error::ValidationError(_))));
}

#[tokio::test]
async fn test_update_copytrader_not_owned() {
    let service = CopytraderService::new();
    let user_id = Uuid::new_v4();

    let created = service
        .create_copytrader(user_id, profile("Alice", "alice@example.com"))
        .await
        .unwrap();

    let update = UpdateCopytrader {
        display_name: "Mallory".to_string(),
        email: "mallory@example.com".to_string(),
        phone: None,
        is_active: true,
        description: None,
    };

    let result = service
        .update_copytrader(Uuid::new_v4(), created.id, update)
        .await;
    assert!(matches!(result, Err(Error::CopytraderNotFound(_))));

    // Profile unchanged
    let fetched = service
        .get_copytrader(user_id, created.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched.display_name, "Alice");
}

#[tokio::test]
async fn test_upsert_settings_creates_then_updates_same_row() {
    let service = CopytraderService::new();
    let user_id = Uuid::new_v4();

    let created = service
        .create_copytrader(user_id, profile("Alice", "alice@example.com"))
        .await
        .unwrap();

    // First submission creates a row
    let first = service
        .upsert_settings(user_id, created.id, settings("wallet-1"))
        .await
        .unwrap();
    assert_eq!(first.payout_wallet, "wallet-1");
    assert_eq!(first.copytrader_id, created.id);

    // Resubmitting updates the same row, not a duplicate
    let mut update = settings("wallet-2");
    update.profit_share_pct = dec!(35);
    let second = service
        .upsert_settings(user_id, created.id, update)
        .await
        .unwrap();
    assert_eq!(second.copytrader_id, created.id);
    assert_eq!(second.payout_wallet, "wallet-2");
    assert_eq!(second.profit_share_pct, dec!(35));

    let stored = service.get_settings(user_id, created.id).await.unwrap();
    assert_eq!(stored.payout_wallet, "wallet-2");
    assert_eq!(stored.profit_share_pct, dec!(35));
}

#[tokio::test]
async fn test_upsert_settings_validation() {
    let service = CopytraderService::new();
    let user_id = Uuid::new_v4();

    let created = service
        .create_copytrader(user_id, profile("Alice", "alice@example.com"))
        .await
        .unwrap();

    let mut bad = settings("wallet-1");
    bad.profit_share_pct = dec!(120);
    let result = service.upsert_settings(user_id, created.id, bad).await;
    assert!(matches!(result, Err(Error::ValidationError(_))));

    let mut bad = settings("wallet-1");
    bad.budget = dec!(-5);
    let result = service.upsert_settings(user_id, created.id, bad).await;
    assert!(matches!(result, Err(Error::ValidationError(_))));

    let result = service
        .upsert_settings(user_id, created.id, settings("   "))
        .await;
    assert!(matches!(result, Err(Error::ValidationError(_))));
}

#[tokio::test]
async fn test_get_settings_falls_back_to_defaults() {
    let service = CopytraderService::new();
    let user_id = Uuid::new_v4();

    let created = service
        .create_copytrader(user_id, profile("Alice", "alice@example.com"))
        .await
        .unwrap();

    let defaults = service.get_settings(user_id, created.id).await.unwrap();
    assert_eq!(defaults.copytrader_id, created.id);
    assert_eq!(defaults.budget, dec!(0));
    assert!(defaults.payout_wallet.is_empty());
}

#[tokio::test]
async fn test_delete_copytrader_removes_settings() {
    let service = CopytraderService::new();
    let user_id = Uuid::new_v4();

    let created = service
        .create_copytrader(user_id, profile("Alice", "alice@example.com"))
        .await
        .unwrap();
    service
        .upsert_settings(user_id, created.id, settings("wallet-1"))
        .await
        .unwrap();

    service.delete_copytrader(user_id, created.id).await.unwrap();

    let result = service.get_copytrader(user_id, created.id).await.unwrap();
    assert!(result.is_none());

    let result = service.delete_copytrader(user_id, created.id).await;
    assert!(matches!(result, Err(Error::CopytraderNotFound(_))));
}

#[tokio::test]
async fn test_credentials_roundtrip() {
    let service = CopytraderService::new();
    let user_id = Uuid::new_v4();

    let created = service
        .create_copytrader(user_id, profile("Alice", "alice@example.com"))
        .await
        .unwrap();

    // No credentials yet
    let result = service
        .verify_credentials("alice@example.com", "correct horse")
        .await;
    assert!(matches!(result, Err(Error::AuthenticationError(_))));

    service
        .set_credentials(user_id, created.id, "correct horse")
        .await
        .unwrap();

    let verified = service
        .verify_credentials("alice@example.com", "correct horse")
        .await
        .unwrap();
    assert_eq!(verified.id, created.id);

    let result = service
        .verify_credentials("alice@example.com", "wrong password")
        .await;
    assert!(matches!(result, Err(Error::AuthenticationError(_))));
}

#[tokio::test]
async fn test_inactive_profile_cannot_authenticate() {
    let service = CopytraderService::new();
    let user_id = Uuid::new_v4();

    let created = service
        .create_copytrader(user_id, profile("Alice", "alice@example.com"))
        .await
        .unwrap();
    service
        .set_credentials(user_id, created.id, "correct horse")
        .await
        .unwrap();

    let update = UpdateCopytrader {
        display_name: created.display_name.clone(),
        email: created.email.clone(),
        phone: None,
        is_active: false,
        description: None,
    };
    service
        .update_copytrader(user_id, created.id, update)
        .await
        .unwrap();

    let result = service
        .verify_credentials("alice@example.com", "correct horse")
        .await;
    assert!(matches!(result, Err(Error::AuthenticationError(_))));
}

#[tokio::test]
async fn test_short_password_rejected() {
    let service = CopytraderService::new();
    let user_id = Uuid::new_v4();

    let created = service
        .create_copytrader(user_id, profile("Alice", "alice@example.com"))
        .await
        .unwrap();

    let result = service.set_credentials(user_id, created.id, "short").await;
    assert!(matches!(result, Err(Error::ValidationError(_))));
}
