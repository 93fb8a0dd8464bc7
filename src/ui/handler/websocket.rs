//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, ConversationSession, RoomId},
    ui::state::AppState,
};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    /// 参加者の表示名（省略時は匿名）
    #[serde(default = "default_display_name")]
    pub name: String,
}

fn default_display_name() -> String {
    "匿名".to_string()
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    // 存在しないルームへの接続はアップグレード前に拒否する
    let room = match state.get_room_usecase.execute(&room_id).await {
        Ok(room) => room,
        Err(e) => {
            tracing::warn!("WebSocket upgrade rejected: {}", e);
            return Err(StatusCode::NOT_FOUND);
        }
    };

    let display_name = query.name;
    tracing::info!("'{}' connecting to room {}", display_name, room.id);
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, room.id, display_name)))
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
///
/// This function handles the outbound message flow: messages broadcast to this
/// connection's room (via rx channel) are sent to this client's WebSocket connection.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            // Send the message to this client
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    room_id: RoomId,
    display_name: String,
) {
    let connection_id = ConnectionId::generate();

    // Create a channel for this connection to receive broadcasts
    let (tx, rx) = mpsc::unbounded_channel();

    // Use ConnectParticipantUseCase to register and announce the connection
    state
        .connect_participant_usecase
        .execute(room_id.clone(), connection_id, tx, &display_name)
        .await;

    let (sender, mut receiver) = socket.split();

    let state_clone = state.clone();
    let room_id_clone = room_id.clone();
    let display_name_clone = display_name.clone();

    // Spawn a task to receive messages from this client
    let mut recv_task = tokio::spawn(async move {
        // この接続専用の会話セッション（ルーム内でも共有しない）
        let mut session = ConversationSession::new();

        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    tracing::info!("Received text: {}", text);

                    // Use RelayMessageUseCase to relay and (for chat) generate a reply
                    if let Err(e) = state_clone
                        .relay_message_usecase
                        .execute(&room_id_clone, &text, &mut session)
                        .await
                    {
                        // 生成失敗はこの接続だけを閉じる
                        tracing::warn!(
                            "Closing connection of '{}': {}",
                            display_name_clone,
                            e
                        );
                        break;
                    }
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!("Client '{}' requested close", display_name_clone);
                    break;
                }
                _ => {}
            }
        }
    });

    // Spawn a task to receive broadcasts for this room and send to this client
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    // Use DisconnectParticipantUseCase to deregister and announce the departure
    state
        .disconnect_participant_usecase
        .execute(&room_id, connection_id, &display_name)
        .await;
    tracing::info!("'{}' disconnected from room {}", display_name, room_id);
}
