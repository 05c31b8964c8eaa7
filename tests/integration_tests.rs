// File: tests/integration_tests.rs
//
// Cross-service flows exercised against the in-memory repositories, the
// same wiring the gateway uses when no database is configured.

mod test_helpers;

use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use uuid::Uuid;

use bot_service::{BotService, NewBot};
use common::error::Error;
use common::model::bot::{BotKind, BotStatus, BotTrade};
use common::model::copytrader::NotifyChannel;
use common::model::funds::SystemFunds;
use common::model::notification::NotificationKind;
use common::model::platform::MarketSession;
use common::model::transfer::{TransferDirection, TransferStatus};
use copytrader_service::{CopytraderService, NewCopytrader, SettingsUpdate, UpdateCopytrader};
use ledger_service::{LedgerService, NewTransfer};
use platform_service::PlatformService;

use test_helpers::{test_user, unique_email};

fn sample_bot(name: &str, kind: BotKind) -> NewBot {
    NewBot {
        name: name.to_string(),
        pair: "EUR/USD".to_string(),
        kind,
        risk_level: 3,
        max_drawdown_pct: dec!(10),
        profit_target_pct: dec!(25),
    }
}

#[tokio::test]
async fn test_bot_lifecycle_end_to_end() {
    let service = BotService::new();
    let user = test_user();

    let bot = service
        .create_bot(user, sample_bot("Momentum", BotKind::Trading))
        .await
        .unwrap();
    assert_eq!(bot.status, BotStatus::Stopped);

    let message = service.start(user, bot.id).await.unwrap();
    assert_eq!(message, "Bot 'Momentum' started successfully");

    // Starting again is a no-op success
    let message = service.start(user, bot.id).await.unwrap();
    assert_eq!(message, "Bot 'Momentum' is already running");

    // Record a couple of simulated trades and check the snapshot
    let now = Utc::now();
    for (profit, age_minutes) in [(dec!(12), 30), (dec!(-4), 20), (dec!(7), 10)] {
        service
            .record_trade(
                user,
                BotTrade {
                    id: Uuid::new_v4(),
                    bot_id: bot.id,
                    pair: bot.pair.clone(),
                    amount: dec!(100),
                    profit,
                    executed_at: now - Duration::minutes(age_minutes),
                },
            )
            .await
            .unwrap();
    }

    let snapshot = service.status(user, bot.id).await.unwrap();
    assert_eq!(snapshot.status, BotStatus::Running);
    assert_eq!(snapshot.performance_metrics.total_trades, 3);
    assert_eq!(snapshot.performance_metrics.profit, dec!(15));
    // Newest first
    assert_eq!(snapshot.recent_trades[0].profit, dec!(7));

    let message = service.stop(user, bot.id).await.unwrap();
    assert_eq!(message, "Bot 'Momentum' stopped successfully");

    service.delete_bot(user, bot.id).await.unwrap();
    assert!(service.get_bot(user, bot.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_contract_bot_supports_lifecycle_but_not_status() {
    let service = BotService::new();
    let user = test_user();

    let bot = service
        .create_bot(user, sample_bot("Arb", BotKind::Contract))
        .await
        .unwrap();

    service.start(user, bot.id).await.unwrap();
    service.stop(user, bot.id).await.unwrap();

    let result = service.status(user, bot.id).await;
    assert!(matches!(result, Err(Error::ValidationError(_))));
}

#[tokio::test]
async fn test_copytrader_onboarding_flow() {
    let service = CopytraderService::new();
    let user = test_user();
    let email = unique_email("trader");

    let copytrader = service
        .create_copytrader(
            user,
            NewCopytrader {
                display_name: "Ada".to_string(),
                email: email.clone(),
                phone: None,
                description: Some("Scalper".to_string()),
            },
        )
        .await
        .unwrap();

    // First settings write creates the row
    let settings = service
        .upsert_settings(
            user,
            copytrader.id,
            SettingsUpdate {
                profit_share_pct: dec!(20),
                budget: dec!(5000),
                payout_wallet: "0xabc".to_string(),
                notify_channel: NotifyChannel::Email,
                subscription_until: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(settings.copytrader_id, copytrader.id);
    assert_eq!(settings.profit_share_pct, dec!(20));

    // Second write updates the same row instead of adding another
    service
        .upsert_settings(
            user,
            copytrader.id,
            SettingsUpdate {
                profit_share_pct: dec!(35),
                budget: dec!(5000),
                payout_wallet: "0xabc".to_string(),
                notify_channel: NotifyChannel::Email,
                subscription_until: None,
            },
        )
        .await
        .unwrap();

    let stored = service.get_settings(user, copytrader.id).await.unwrap();
    assert_eq!(stored.profit_share_pct, dec!(35));

    // Credentials allow a login until the profile is deactivated
    service
        .set_credentials(user, copytrader.id, "correct horse battery")
        .await
        .unwrap();

    let verified = service
        .verify_credentials(&email, "correct horse battery")
        .await
        .unwrap();
    assert_eq!(verified.id, copytrader.id);

    service
        .update_copytrader(
            user,
            copytrader.id,
            UpdateCopytrader {
                display_name: "Ada".to_string(),
                email: email.clone(),
                phone: None,
                is_active: false,
                description: Some("Scalper".to_string()),
            },
        )
        .await
        .unwrap();

    let result = service
        .verify_credentials(&email, "correct horse battery")
        .await;
    assert!(matches!(result, Err(Error::AuthenticationError(_))));
}

#[tokio::test]
async fn test_transfers_and_funds_flow() {
    let service = LedgerService::new();
    let user = test_user();

    let deposit = service
        .create_deposit(
            user,
            NewTransfer {
                amount: dec!(100),
                currency: "usdt".to_string(),
                wallet_address: "TAbc123".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(deposit.status, TransferStatus::Pending);
    assert_eq!(deposit.currency, "USDT");

    service
        .create_withdrawal(
            user,
            NewTransfer {
                amount: dec!(40),
                currency: "USDT".to_string(),
                wallet_address: "TAbc123".to_string(),
            },
        )
        .await
        .unwrap();

    let deposits = service.list_deposits(user, 50).await.unwrap();
    assert_eq!(deposits.len(), 1);

    // Recent view merges both directions, newest first
    let recent = service.recent_transfers(user, 50).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].direction, TransferDirection::Withdrawal);
    assert_eq!(recent[1].direction, TransferDirection::Deposit);

    // No balance row yet reads as zeroes
    let funds = service.get_funds(user).await.unwrap();
    assert_eq!(funds.system_fund, dec!(0));
    assert_eq!(funds.withdrawable, dec!(0));

    let mut updated = SystemFunds::zeroed(user);
    updated.system_fund = dec!(1000);
    updated.withdrawable = dec!(250);
    service.put_funds(updated).await.unwrap();

    let funds = service.get_funds(user).await.unwrap();
    assert_eq!(funds.system_fund, dec!(1000));
    assert_eq!(funds.withdrawable, dec!(250));
}

#[tokio::test]
async fn test_platform_state_and_notifications_flow() {
    let service = PlatformService::new();
    let user = test_user();

    // Fresh platform defaults to trading enabled
    let state = service.platform_state().await.unwrap();
    assert!(!state.trading_halted);

    let state = service
        .set_trading_halted(true, Some("Maintenance window".to_string()))
        .await
        .unwrap();
    assert!(state.trading_halted);
    assert_eq!(state.reason.as_deref(), Some("Maintenance window"));

    let state = service.platform_state().await.unwrap();
    assert!(state.trading_halted);

    let notification = service
        .notify(user, "Deposit submitted", "100 USDT pending", NotificationKind::Transfer)
        .await
        .unwrap();
    assert!(!notification.read);

    let listed = service.list_notifications(user, 100).await.unwrap();
    assert_eq!(listed.len(), 1);

    let read = service
        .mark_notification_read(user, notification.id)
        .await
        .unwrap();
    assert!(read.read);
}

#[tokio::test]
async fn test_market_session_update_roundtrip() {
    let service = PlatformService::new();

    let stored = service
        .set_market_session(MarketSession {
            open_weekday: 6,
            open_hour: 22,
            close_weekday: 4,
            close_hour: 21,
        })
        .await
        .unwrap();
    assert_eq!(stored.open_weekday, 6);

    let session = service.market_session().await.unwrap();
    assert_eq!(session.close_hour, 21);

    // Out-of-range weekday is rejected and leaves the window untouched
    let result = service
        .set_market_session(MarketSession {
            open_weekday: 7,
            open_hour: 0,
            close_weekday: 4,
            close_hour: 21,
        })
        .await;
    assert!(matches!(result, Err(Error::ValidationError(_))));

    let session = service.market_session().await.unwrap();
    assert_eq!(session.open_weekday, 6);
}

#[cfg(feature = "db_tests")]
mod db_tests {
    use super::*;
    use test_helpers::DbTestContext;

    #[tokio::test]
    async fn test_bot_lifecycle_against_postgres() {
        let ctx = DbTestContext::new().await;
        let user = test_user();

        let service = BotService::with_repository(bot_service::RepositoryType::Postgres(Some(
            ctx.database_url.clone(),
        )))
        .await
        .unwrap();

        let bot = service
            .create_bot(user, sample_bot("Persisted", BotKind::Trading))
            .await
            .unwrap();

        service.start(user, bot.id).await.unwrap();
        let fetched = service.get_bot(user, bot.id).await.unwrap().unwrap();
        assert!(fetched.status.is_running());

        service
            .record_failure(user, bot.id, "Feed disconnected".to_string())
            .await
            .unwrap();
        let fetched = service.get_bot(user, bot.id).await.unwrap().unwrap();
        assert_eq!(fetched.status.reason(), Some("Feed disconnected"));

        ctx.cleanup().await;
    }
}
