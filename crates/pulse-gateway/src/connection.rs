use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use bytes::Bytes;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, trace};
use uuid::Uuid;

use pulse_db::Database;
use pulse_types::events::{GatewayCommand, GatewayEvent, StoreChange};

use crate::dispatcher::Dispatcher;

/// Heartbeat interval: server sends a Ping every 15 seconds so dead peers
/// surface as send errors.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Handle a single subscribed client. The caller has already resolved the
/// user, so the socket goes straight to Ready, an initial full list, then
/// the invalidate-and-refetch loop.
pub async fn handle_connection(
    socket: WebSocket,
    dispatcher: Dispatcher,
    db: Arc<Database>,
    user_id: Uuid,
    user_name: String,
) {
    let (mut sender, mut receiver) = socket.split();

    info!("{} ({}) connected to gateway", user_name, user_id);

    let ready = GatewayEvent::Ready {
        user_id,
        user_name: user_name.clone(),
    };
    if send_frame(&mut sender, &ready).await.is_err() {
        return;
    }

    // Initial snapshot, then resync on every store change.
    if push_event_list(&mut sender, &db, user_id).await.is_err() {
        return;
    }

    let mut changes = dispatcher.subscribe();
    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    heartbeat.tick().await; // first tick completes immediately

    loop {
        tokio::select! {
            change = changes.recv() => match change {
                // Falling behind the broadcast is handled the same way as
                // any invalidation: refetch the whole list.
                Ok(StoreChange::EventsChanged) | Err(RecvError::Lagged(_)) => {
                    if push_event_list(&mut sender, &db, user_id).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Closed) => break,
            },
            msg = receiver.next() => {
                if !handle_client_frame(msg, &mut sender, &db, user_id).await {
                    break;
                }
            }
            _ = heartbeat.tick() => {
                if sender.send(Message::Ping(Bytes::new())).await.is_err() {
                    break;
                }
            }
        }
    }

    info!("{} ({}) disconnected from gateway", user_name, user_id);
}

/// Returns false when the connection should be torn down.
async fn handle_client_frame(
    msg: Option<Result<Message, axum::Error>>,
    sender: &mut SplitSink<WebSocket, Message>,
    db: &Arc<Database>,
    user_id: Uuid,
) -> bool {
    match msg {
        Some(Ok(Message::Text(text))) => {
            match serde_json::from_str::<GatewayCommand>(&text) {
                Ok(GatewayCommand::Resync) => {
                    push_event_list(sender, db, user_id).await.is_ok()
                }
                Err(e) => {
                    trace!("Ignoring unparseable gateway frame: {}", e);
                    true
                }
            }
        }
        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => false,
        // Pongs and binary frames
        Some(Ok(_)) => true,
    }
}

async fn push_event_list(
    sender: &mut SplitSink<WebSocket, Message>,
    db: &Arc<Database>,
    user_id: Uuid,
) -> Result<(), axum::Error> {
    let db = db.clone();
    let uid = user_id.to_string();
    let events = match tokio::task::spawn_blocking(move || db.load_events_visible_to(&uid)).await {
        Ok(Ok(events)) => events,
        Ok(Err(e)) => {
            // Store failure: abandon this push, keep the connection; the
            // client keeps its previous list.
            error!("Failed to load event list for {}: {}", user_id, e);
            return Ok(());
        }
        Err(e) => {
            error!("spawn_blocking join error: {}", e);
            return Ok(());
        }
    };
    send_frame(sender, &GatewayEvent::EventList { events }).await
}

async fn send_frame(
    sender: &mut SplitSink<WebSocket, Message>,
    event: &GatewayEvent,
) -> Result<(), axum::Error> {
    let text = serde_json::to_string(event).unwrap();
    sender.send(Message::Text(text.into())).await
}
