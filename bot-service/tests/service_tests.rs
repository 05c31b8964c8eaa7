use bot_service::{BotService, NewBot, RepositoryType};
use chrono::Utc;
use common::decimal::dec;
use common::error::Error;
use common::model::bot::{BotKind, BotStatus, BotTrade};
use uuid::Uuid;

fn new_bot(kind: BotKind) -> NewBot {
    NewBot {
        name: "Momentum".to_string(),
        pair: "BTC/USDT".to_string(),
        kind,
        risk_level: 5,
        max_drawdown_pct: dec!(15),
        profit_target_pct: dec!(30),
    }
}

async fn service() -> BotService {
    BotService::with_repository(RepositoryType::InMemory).await.unwrap()
}

#[tokio::test]
async fn test_create_bot_defaults_to_stopped() {
    let service = service().await;
    let user_id = Uuid::new_v4();

    let bot = service.create_bot(user_id, new_bot(BotKind::Trading)).await.unwrap();
    assert_eq!(bot.status, BotStatus::Stopped);
    assert_eq!(bot.user_id, user_id);
}

#[tokio::test]
async fn test_create_bot_validation() {
    let service = service().await;
    let user_id = Uuid::new_v4();

    let mut bad_name = new_bot(BotKind::Trading);
    bad_name.name = "  ".to_string();
    assert!(matches!(
        service.create_bot(user_id, bad_name).await,
        Err(Error::ValidationError(_))
    ));

    let mut bad_risk = new_bot(BotKind::Trading);
    bad_risk.risk_level = 11;
    assert!(matches!(
        service.create_bot(user_id, bad_risk).await,
        Err(Error::ValidationError(_))
    ));

    let mut bad_pct = new_bot(BotKind::Trading);
    bad_pct.max_drawdown_pct = dec!(-1);
    assert!(matches!(
        service.create_bot(user_id, bad_pct).await,
        Err(Error::ValidationError(_))
    ));
}

#[tokio::test]
async fn test_start_then_status_is_running() {
    let service = service().await;
    let user_id = Uuid::new_v4();

    let bot = service.create_bot(user_id, new_bot(BotKind::Trading)).await.unwrap();
    service.start(user_id, bot.id).await.unwrap();

    let snapshot = service.status(user_id, bot.id).await.unwrap();
    assert!(snapshot.status.is_running());
}

#[tokio::test]
async fn test_start_not_owned_fails_and_status_unchanged() {
    let service = service().await;
    let owner = Uuid::new_v4();
    let stranger = Uuid::new_v4();

    let bot = service.create_bot(owner, new_bot(BotKind::Trading)).await.unwrap();

    let result = service.start(stranger, bot.id).await;
    assert!(matches!(result, Err(Error::BotNotFound(_))));

    let snapshot = service.status(owner, bot.id).await.unwrap();
    assert_eq!(snapshot.status, BotStatus::Stopped);
}

#[tokio::test]
async fn test_stop_twice_is_idempotent() {
    let service = service().await;
    let user_id = Uuid::new_v4();

    let bot = service.create_bot(user_id, new_bot(BotKind::Trading)).await.unwrap();
    service.start(user_id, bot.id).await.unwrap();

    service.stop(user_id, bot.id).await.unwrap();
    // Second stop succeeds and leaves the status at Stopped
    let message = service.stop(user_id, bot.id).await.unwrap();
    assert!(message.contains("already stopped"));

    let fetched = service.get_bot(user_id, bot.id).await.unwrap().unwrap();
    assert_eq!(fetched.status, BotStatus::Stopped);
}

#[tokio::test]
async fn test_start_from_failed_clears_reason() {
    let service = service().await;
    let user_id = Uuid::new_v4();

    let bot = service.create_bot(user_id, new_bot(BotKind::Trading)).await.unwrap();
    service
        .record_failure(user_id, bot.id, "stale feed".to_string())
        .await
        .unwrap();

    let failed = service.get_bot(user_id, bot.id).await.unwrap().unwrap();
    assert_eq!(failed.status.reason(), Some("stale feed"));

    service.start(user_id, bot.id).await.unwrap();

    let running = service.get_bot(user_id, bot.id).await.unwrap().unwrap();
    assert!(running.status.is_running());
    assert!(running.status.reason().is_none());
}

#[tokio::test]
async fn test_status_rejected_for_contract_bots() {
    let service = service().await;
    let user_id = Uuid::new_v4();

    let bot = service.create_bot(user_id, new_bot(BotKind::Contract)).await.unwrap();
    // Contract bots still start and stop
    service.start(user_id, bot.id).await.unwrap();

    assert!(matches!(
        service.status(user_id, bot.id).await,
        Err(Error::ValidationError(_))
    ));
}

#[tokio::test]
async fn test_status_snapshot_metrics() {
    let service = service().await;
    let user_id = Uuid::new_v4();

    let bot = service.create_bot(user_id, new_bot(BotKind::Trading)).await.unwrap();

    for (i, profit) in [dec!(5), dec!(-2), dec!(3), dec!(-1)].iter().enumerate() {
        service
            .record_trade(
                user_id,
                BotTrade {
                    id: Uuid::new_v4(),
                    bot_id: bot.id,
                    pair: "BTC/USDT".to_string(),
                    amount: dec!(100),
                    profit: *profit,
                    executed_at: Utc::now() - chrono::Duration::minutes(i as i64),
                },
            )
            .await
            .unwrap();
    }

    let snapshot = service.status(user_id, bot.id).await.unwrap();
    assert_eq!(snapshot.performance_metrics.total_trades, 4);
    assert_eq!(snapshot.performance_metrics.win_rate_pct, dec!(50));
    assert_eq!(snapshot.performance_metrics.profit, dec!(5));
    assert_eq!(snapshot.recent_trades.len(), 4);
}
