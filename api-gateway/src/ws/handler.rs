//! WebSocket handler implementation
//!
//! Clients subscribe to cache-invalidation topics; on each invalidation
//! event they receive a notification naming the collection (and sub-key)
//! that changed so they can refetch the affected view.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{State, WebSocketUpgrade},
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info};
use uuid::Uuid;
use view_cache::Topic;

use crate::ws::message::{Subscription, WsError, WsNotification, WsRequest, WsResponse};
use crate::AppState;

/// Handle WebSocket connection
pub async fn ws_handler(
    State(state): State<Arc<AppState>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle WebSocket connection
async fn handle_socket(socket: axum::extract::ws::WebSocket, state: Arc<AppState>) {
    let client_id = Uuid::new_v4();
    let subscriptions: Arc<Mutex<HashSet<Subscription>>> = Arc::new(Mutex::new(HashSet::new()));

    info!("New WebSocket connection: {}", client_id);

    let invalidation_channel = state.cache.channel();

    // Channel for sending messages to the client
    let (tx, mut rx) = mpsc::channel(100);

    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Forward messages from the channel to the WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if let Err(e) = ws_sender
                .send(axum::extract::ws::Message::Text(message))
                .await
            {
                error!("Error sending message: {}", e);
                break;
            }
        }

        let _ = ws_sender.close().await;
    });

    let tx_clone = tx.clone();

    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(axum::extract::ws::Message::Text(text)) => {
                debug!("Received text message: {}", text);

                let request: WsRequest = match serde_json::from_str(&text) {
                    Ok(req) => req,
                    Err(e) => {
                        if send_error(&tx, "0", 400, format!("Invalid request: {}", e))
                            .await
                            .is_err()
                        {
                            break;
                        }
                        continue;
                    }
                };

                match request.method.as_str() {
                    "subscribe" => {
                        // Optional collection parameter; absent means all
                        let collection = request.params.get("collection").and_then(|c| {
                            if let serde_json::Value::String(collection) = c {
                                Some(collection.clone())
                            } else {
                                None
                            }
                        });

                        let topic = match collection.clone() {
                            Some(collection) => Topic::Collection(collection),
                            None => Topic::AllCollections,
                        };

                        let (receiver, channel_sub_id) =
                            invalidation_channel.subscribe(topic).await;
                        let subscription_id = channel_sub_id;

                        // The crossbeam receiver blocks, so the forwarding
                        // loop runs on the blocking pool instead of pinning
                        // an async worker thread
                        let sub_tx = tx_clone.clone();
                        tokio::task::spawn_blocking(move || {
                            while let Ok(event) = receiver.recv() {
                                let notification = WsNotification {
                                    method: "invalidation".to_string(),
                                    params: json!({
                                        "collection": event.collection,
                                        "sub_key": event.sub_key,
                                        "subscription_id": subscription_id.to_string(),
                                    }),
                                };

                                if let Err(e) =
                                    sub_tx.blocking_send(serde_json::to_string(&notification).unwrap())
                                {
                                    error!("Error sending notification: {}", e);
                                    break;
                                }
                            }

                            debug!("Subscription handler for {} exited", subscription_id);
                        });

                        {
                            let mut subs = subscriptions.lock().await;
                            subs.insert(Subscription {
                                collection: collection.clone(),
                                id: subscription_id,
                            });
                        }

                        let response = WsResponse {
                            id: request.id,
                            result: Some(json!({
                                "subscriptionId": subscription_id,
                                "collection": collection,
                            })),
                            error: None,
                        };

                        if tx
                            .send(serde_json::to_string(&response).unwrap())
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                    "unsubscribe" => {
                        let subscription_id = match request
                            .params
                            .get("subscriptionId")
                            .and_then(|v| v.as_str())
                            .and_then(|v| Uuid::parse_str(v).ok())
                        {
                            Some(id) => id,
                            None => {
                                if send_error(
                                    &tx,
                                    &request.id,
                                    400,
                                    "Missing or invalid subscriptionId parameter".to_string(),
                                )
                                .await
                                .is_err()
                                {
                                    break;
                                }
                                continue;
                            }
                        };

                        let removed = {
                            let mut subs = subscriptions.lock().await;
                            let before = subs.len();
                            subs.retain(|s| s.id != subscription_id);
                            subs.len() < before
                        };

                        if removed {
                            invalidation_channel.unsubscribe_by_id(subscription_id).await;

                            let response = WsResponse {
                                id: request.id,
                                result: Some(json!({ "unsubscribed": true })),
                                error: None,
                            };
                            if tx
                                .send(serde_json::to_string(&response).unwrap())
                                .await
                                .is_err()
                            {
                                break;
                            }
                        } else if send_error(
                            &tx,
                            &request.id,
                            404,
                            "Subscription not found".to_string(),
                        )
                        .await
                        .is_err()
                        {
                            break;
                        }
                    }
                    "ping" => {
                        let response = WsResponse {
                            id: request.id,
                            result: Some(json!({
                                "pong": chrono::Utc::now().to_rfc3339(),
                            })),
                            error: None,
                        };

                        if tx
                            .send(serde_json::to_string(&response).unwrap())
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                    _ => {
                        if send_error(
                            &tx,
                            &request.id,
                            400,
                            format!("Unknown method: {}", request.method),
                        )
                        .await
                        .is_err()
                        {
                            break;
                        }
                    }
                }
            }
            Ok(axum::extract::ws::Message::Close(_)) => {
                debug!("Received close message");
                break;
            }
            Err(e) => {
                error!("Error receiving message: {}", e);
                break;
            }
            _ => {}
        }
    }

    // Connection closed, clean up
    info!("WebSocket connection closed: {}", client_id);

    send_task.abort();

    let subs = {
        let mut subs = subscriptions.lock().await;
        std::mem::take(&mut *subs)
    };
    for sub in subs {
        invalidation_channel.unsubscribe_by_id(sub.id).await;
    }
}

async fn send_error(
    tx: &mpsc::Sender<String>,
    request_id: &str,
    code: i32,
    message: String,
) -> Result<(), mpsc::error::SendError<String>> {
    let response = WsResponse {
        id: request_id.to_string(),
        result: None,
        error: Some(WsError { code, message }),
    };

    tx.send(serde_json::to_string(&response).unwrap()).await
}
