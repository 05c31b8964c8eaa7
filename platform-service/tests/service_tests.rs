//! Tests for the platform service

use common::error::Error;
use common::model::notification::NotificationKind;
use common::model::platform::MarketSession;
use platform_service::PlatformService;
use uuid::Uuid;

#[tokio::test]
async fn test_notifications_listed_newest_first() {
    let service = PlatformService::new();
    let user_id = Uuid::new_v4();

    for i in 1..=3 {
        service
            .notify(
                user_id,
                format!("Event {}", i),
                "something happened",
                NotificationKind::System,
            )
            .await
            .unwrap();
    }

    let notifications = service.list_notifications(user_id, 100).await.unwrap();
    assert_eq!(notifications.len(), 3);
    assert!(notifications.iter().all(|n| !n.read));
    for window in notifications.windows(2) {
        assert!(window[0].created_at >= window[1].created_at);
    }
}

#[tokio::test]
async fn test_mark_read_is_owner_scoped() {
    let service = PlatformService::new();
    let user_id = Uuid::new_v4();

    let notification = service
        .notify(user_id, "Bot started", "Bot 'alpha' started", NotificationKind::Bot)
        .await
        .unwrap();

    let result = service
        .mark_notification_read(Uuid::new_v4(), notification.id)
        .await;
    assert!(matches!(result, Err(Error::NotificationNotFound(_))));

    let updated = service
        .mark_notification_read(user_id, notification.id)
        .await
        .unwrap();
    assert!(updated.read);
}

#[tokio::test]
async fn test_platform_state_defaults_to_trading_enabled() {
    let service = PlatformService::new();

    let state = service.platform_state().await.unwrap();
    assert!(!state.trading_halted);
    assert!(state.reason.is_none());
}

#[tokio::test]
async fn test_first_platform_state_read_persists_the_default() {
    let service = PlatformService::new();

    // The first read stores the default row; a fresh default would carry a
    // new timestamp, so a stable one proves the read came from the store
    let first = service.platform_state().await.unwrap();
    let second = service.platform_state().await.unwrap();
    assert_eq!(first.updated_at, second.updated_at);
}

#[tokio::test]
async fn test_halt_and_resume_trading() {
    let service = PlatformService::new();

    let halted = service
        .set_trading_halted(true, Some("maintenance window".to_string()))
        .await
        .unwrap();
    assert!(halted.trading_halted);
    assert_eq!(halted.reason.as_deref(), Some("maintenance window"));

    let state = service.platform_state().await.unwrap();
    assert!(state.trading_halted);

    let resumed = service.set_trading_halted(false, None).await.unwrap();
    assert!(!resumed.trading_halted);
}

#[tokio::test]
async fn test_market_session_defaults_and_update() {
    let service = PlatformService::new();

    let session = service.market_session().await.unwrap();
    assert_eq!(session, MarketSession::default());

    let custom = MarketSession {
        open_weekday: 0,
        open_hour: 8,
        close_weekday: 4,
        close_hour: 17,
    };
    service.set_market_session(custom).await.unwrap();

    let stored = service.market_session().await.unwrap();
    assert_eq!(stored, custom);
}

#[tokio::test]
async fn test_market_session_validation() {
    let service = PlatformService::new();

    let result = service
        .set_market_session(MarketSession {
            open_weekday: 7,
            open_hour: 0,
            close_weekday: 4,
            close_hour: 22,
        })
        .await;
    assert!(matches!(result, Err(Error::ValidationError(_))));

    let result = service
        .set_market_session(MarketSession {
            open_weekday: 0,
            open_hour: 24,
            close_weekday: 4,
            close_hour: 22,
        })
        .await;
    assert!(matches!(result, Err(Error::ValidationError(_))));

    // Zero-length window
    let result = service
        .set_market_session(MarketSession {
            open_weekday: 2,
            open_hour: 9,
            close_weekday: 2,
            close_hour: 9,
        })
        .await;
    assert!(matches!(result, Err(Error::ValidationError(_))));
}

#[tokio::test]
async fn test_market_countdown_uses_stored_session() {
    let service = PlatformService::new();

    let countdown = service.market_countdown().await.unwrap();
    // Always a sensible figure regardless of when the test runs
    assert!(countdown.seconds_remaining > 0);
    assert!(countdown.seconds_remaining <= 7 * 24 * 3600);
}
