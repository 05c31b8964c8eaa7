//! Handler-level tests for cache key composition
//!
//! These drive the axum handlers directly against in-memory services to pin
//! down two properties of the read-through cache: settings entries are
//! scoped to their owner, and list entries carry the requested limit.

use std::sync::Arc;

use api_gateway::api::copytraders::{self, SettingsRequest};
use api_gateway::api::notifications::{self, NotificationsQuery};
use api_gateway::api::transfers::{self, CreateTransferRequest, ListQuery};
use api_gateway::auth::{AuthUser, SessionStore};
use api_gateway::config::AppConfig;
use api_gateway::mailer::Mailer;
use api_gateway::AppState;
use axum::extract::{Path, Query, State};
use axum::Json;
use common::model::copytrader::NotifyChannel;
use common::model::session::Role;
use copytrader_service::NewCopytrader;
use rust_decimal_macros::dec;
use uuid::Uuid;

fn app_state() -> Arc<AppState> {
    let config = AppConfig::new();
    let mailer = Mailer::from_config(&config);
    Arc::new(AppState {
        bot_service: Arc::new(bot_service::BotService::new()),
        copytrader_service: Arc::new(copytrader_service::CopytraderService::new()),
        ledger_service: Arc::new(ledger_service::LedgerService::new()),
        platform_service: Arc::new(platform_service::PlatformService::new()),
        cache: Arc::new(view_cache::ViewCache::new()),
        sessions: SessionStore::new(24),
        mailer,
        config,
    })
}

fn auth(user_id: Uuid) -> AuthUser {
    AuthUser {
        user_id,
        role: Role::Admin,
        email: None,
    }
}

async fn submit_deposit(state: &Arc<AppState>, user: &AuthUser, amount: rust_decimal::Decimal) {
    transfers::create_deposit(
        State(state.clone()),
        user.clone(),
        Json(CreateTransferRequest {
            amount,
            currency: "USDT".to_string(),
            wallet_address: "0xabc".to_string(),
        }),
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn test_settings_cache_is_scoped_to_the_owner() {
    let state = app_state();
    let owner = auth(Uuid::new_v4());

    let copytrader = state
        .copytrader_service
        .create_copytrader(
            owner.user_id,
            NewCopytrader {
                display_name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                phone: None,
                description: None,
            },
        )
        .await
        .unwrap();

    copytraders::upsert_settings(
        State(state.clone()),
        owner.clone(),
        Path(copytrader.id),
        Json(SettingsRequest {
            profit_share_pct: dec!(20),
            budget: dec!(1000),
            payout_wallet: "0xpayout".to_string(),
            notify_channel: NotifyChannel::Email,
            subscription_until: None,
        }),
    )
    .await
    .unwrap();

    // Owner read warms the cache
    let response =
        copytraders::get_settings(State(state.clone()), owner.clone(), Path(copytrader.id))
            .await
            .unwrap();
    assert_eq!(response.data.profit_share_pct, dec!(20));

    // A different user asking for the same copytrader must not be served
    // the cached entry
    let stranger = auth(Uuid::new_v4());
    let result =
        copytraders::get_settings(State(state.clone()), stranger, Path(copytrader.id)).await;
    assert!(result.is_err());

    // The owner's entry is still intact
    let again = copytraders::get_settings(State(state.clone()), owner, Path(copytrader.id))
        .await
        .unwrap();
    assert_eq!(again.data.budget, dec!(1000));
}

#[tokio::test]
async fn test_transfer_listings_honor_the_requested_limit() {
    let state = app_state();
    let user = auth(Uuid::new_v4());

    for i in 1..=3 {
        submit_deposit(&state, &user, dec!(10) * rust_decimal::Decimal::from(i)).await;
    }

    // A small limit must not poison the cache for larger ones
    let short = transfers::list_deposits(
        State(state.clone()),
        user.clone(),
        Query(ListQuery { limit: Some(1) }),
    )
    .await
    .unwrap();
    assert_eq!(short.data.len(), 1);

    let full = transfers::list_deposits(
        State(state.clone()),
        user.clone(),
        Query(ListQuery { limit: Some(50) }),
    )
    .await
    .unwrap();
    assert_eq!(full.data.len(), 3);

    // Creating another deposit drops every cached limit variant
    submit_deposit(&state, &user, dec!(40)).await;
    let refreshed = transfers::list_deposits(
        State(state.clone()),
        user,
        Query(ListQuery { limit: Some(50) }),
    )
    .await
    .unwrap();
    assert_eq!(refreshed.data.len(), 4);
}

#[tokio::test]
async fn test_notification_listings_honor_the_requested_limit() {
    let state = app_state();
    let user = auth(Uuid::new_v4());

    // Each deposit records a notification
    for _ in 0..3 {
        submit_deposit(&state, &user, dec!(25)).await;
    }

    let short = notifications::list_notifications(
        State(state.clone()),
        user.clone(),
        Query(NotificationsQuery { limit: Some(2) }),
    )
    .await
    .unwrap();
    assert_eq!(short.data.len(), 2);

    let full = notifications::list_notifications(
        State(state.clone()),
        user,
        Query(NotificationsQuery { limit: Some(50) }),
    )
    .await
    .unwrap();
    assert_eq!(full.data.len(), 3);
}
