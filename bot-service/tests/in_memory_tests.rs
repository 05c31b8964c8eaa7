use bot_service::InMemoryBotRepository;
use bot_service::repository::BotRepository;
use chrono::Utc;
use common::decimal::dec;
use common::model::bot::{Bot, BotKind, BotStatus, BotTrade};
use uuid::Uuid;

fn sample_bot(user_id: Uuid, kind: BotKind) -> Bot {
    Bot::new(
        user_id,
        "Scalper".to_string(),
        "EUR/USD".to_string(),
        kind,
        3,
        dec!(10),
        dec!(25),
    )
}

#[tokio::test]
async fn test_create_and_get_bot() {
    let repo = InMemoryBotRepository::new();
    let user_id = Uuid::new_v4();

    let bot = repo.create_bot(sample_bot(user_id, BotKind::Trading)).await.unwrap();
    assert_eq!(bot.status, BotStatus::Stopped);

    let fetched = repo.get_bot(user_id, bot.id).await.unwrap().unwrap();
    assert_eq!(fetched.id, bot.id);
    assert_eq!(fetched.name, "Scalper");

    // Another user cannot see the row
    let other = repo.get_bot(Uuid::new_v4(), bot.id).await.unwrap();
    assert!(other.is_none());
}

#[tokio::test]
async fn test_list_bots_ordering_and_kind_filter() {
    let repo = InMemoryBotRepository::new();
    let user_id = Uuid::new_v4();

    let mut first = sample_bot(user_id, BotKind::Trading);
    first.created_at = Utc::now() - chrono::Duration::minutes(10);
    let mut second = sample_bot(user_id, BotKind::Contract);
    second.created_at = Utc::now() - chrono::Duration::minutes(5);
    let mut third = sample_bot(user_id, BotKind::Trading);
    third.created_at = Utc::now();

    repo.create_bot(first.clone()).await.unwrap();
    repo.create_bot(second.clone()).await.unwrap();
    repo.create_bot(third.clone()).await.unwrap();

    // Newest first
    let all = repo.list_bots(user_id, None).await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].id, third.id);
    assert_eq!(all[2].id, first.id);

    let contract_only = repo.list_bots(user_id, Some(BotKind::Contract)).await.unwrap();
    assert_eq!(contract_only.len(), 1);
    assert_eq!(contract_only[0].id, second.id);
}

#[tokio::test]
async fn test_set_status_owner_scoped() {
    let repo = InMemoryBotRepository::new();
    let user_id = Uuid::new_v4();

    let bot = repo.create_bot(sample_bot(user_id, BotKind::Trading)).await.unwrap();

    // Wrong owner: no row updated
    let denied = repo
        .set_status(Uuid::new_v4(), bot.id, &BotStatus::Running)
        .await
        .unwrap();
    assert!(denied.is_none());

    let updated = repo
        .set_status(user_id, bot.id, &BotStatus::Running)
        .await
        .unwrap()
        .unwrap();
    assert!(updated.status.is_running());

    let failed = repo
        .set_status(
            user_id,
            bot.id,
            &BotStatus::Failed {
                reason: "margin call".to_string(),
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(failed.status.reason(), Some("margin call"));
}

#[tokio::test]
async fn test_delete_bot_removes_trades() {
    let repo = InMemoryBotRepository::new();
    let user_id = Uuid::new_v4();

    let bot = repo.create_bot(sample_bot(user_id, BotKind::Trading)).await.unwrap();

    repo.record_trade(BotTrade {
        id: Uuid::new_v4(),
        bot_id: bot.id,
        pair: "EUR/USD".to_string(),
        amount: dec!(100),
        profit: dec!(4),
        executed_at: Utc::now(),
    })
    .await
    .unwrap();

    assert!(repo.delete_bot(user_id, bot.id).await.unwrap());
    assert!(repo.get_bot(user_id, bot.id).await.unwrap().is_none());
    assert!(repo.recent_trades(bot.id, 10).await.unwrap().is_empty());

    // Second delete is a no-op
    assert!(!repo.delete_bot(user_id, bot.id).await.unwrap());
}

#[tokio::test]
async fn test_recent_trades_newest_first_and_truncated() {
    let repo = InMemoryBotRepository::new();
    let user_id = Uuid::new_v4();
    let bot = repo.create_bot(sample_bot(user_id, BotKind::Trading)).await.unwrap();

    for i in 0..5 {
        repo.record_trade(BotTrade {
            id: Uuid::new_v4(),
            bot_id: bot.id,
            pair: "EUR/USD".to_string(),
            amount: dec!(100),
            profit: dec!(1) * rust_decimal::Decimal::from(i),
            executed_at: Utc::now() - chrono::Duration::minutes(10 - i),
        })
        .await
        .unwrap();
    }

    let trades = repo.recent_trades(bot.id, 3).await.unwrap();
    assert_eq!(trades.len(), 3);
    assert!(trades[0].executed_at >= trades[1].executed_at);
    assert!(trades[1].executed_at >= trades[2].executed_at);
}
