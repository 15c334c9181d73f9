//! WebSocket Handler
//!
//! Resolves the requested room, upgrades the HTTP connection and hands the
//! socket to a chat session.

use axum::{
    extract::{
        ws::{
            close_code, rejection::WebSocketUpgradeRejection, CloseFrame, Message, WebSocket,
            WebSocketUpgrade,
        },
        Query, State,
    },
    response::{IntoResponse, Response},
};
use futures_util::StreamExt;
use std::sync::Arc;

use crate::api::dto::ConnectParams;
use crate::api::{ApiError, AppState};
use crate::chat::{ClientSession, RoomError, RoomHandle, SessionConfig};

/// WebSocket upgrade handler
///
/// The room is resolved before upgrading, so an unknown room is rejected
/// with a plain HTTP error and never falls back to the default room.
pub async fn websocket_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ConnectParams>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let room = match state.registry.resolve(params.room.as_deref()).await {
        Ok(room) => room,
        Err(e) => return ApiError::from(e).into_response(),
    };

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return rejection.into_response(),
    };

    let nickname = params.nick.unwrap_or_default();
    let config = state.session_config.clone();

    ws.max_message_size(config.max_message_size)
        .on_upgrade(move |socket| handle_socket(socket, room, nickname, config))
}

/// Handle an established WebSocket connection
async fn handle_socket(
    mut socket: WebSocket,
    room: RoomHandle,
    nickname: String,
    config: SessionConfig,
) {
    let session = ClientSession::new(&nickname, room, config);
    let session_id = session.id();
    let room_name = session.room().name().to_string();

    let joined = match session.join().await {
        Ok(joined) => joined,
        Err(e) => {
            tracing::info!(
                session_id = %session_id,
                room = %room_name,
                error = %e,
                "WebSocket session rejected"
            );
            let _ = socket
                .send(Message::Close(Some(rejection_frame(&e))))
                .await;
            return;
        }
    };

    tracing::info!(
        session_id = %session_id,
        room = %room_name,
        nickname = %joined.nickname(),
        "WebSocket connected"
    );

    let (sink, stream) = socket.split();
    joined.start(sink, stream).wait().await;

    tracing::debug!(session_id = %session_id, "WebSocket disconnected");
}

/// Close frame for a session whose join was refused
///
/// A full room asks the client to try again later; any other failure means
/// the room is going away.
fn rejection_frame(error: &RoomError) -> CloseFrame<'static> {
    let code = match error {
        RoomError::Full { .. } => close_code::AGAIN,
        _ => close_code::AWAY,
    };
    CloseFrame {
        code,
        reason: error.to_string().into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{HubConfig, Member};
    use tokio::sync::mpsc;
    use uuid::Uuid;

    #[test]
    fn test_full_room_asks_client_to_retry() {
        let frame = rejection_frame(&RoomError::Full {
            name: "tiny".to_string(),
            capacity: 1,
        });
        assert_eq!(frame.code, close_code::AGAIN);
        assert_eq!(frame.code, 1013);
        assert_eq!(frame.reason, "Room tiny is full (capacity: 1)");
    }

    #[test]
    fn test_closed_room_goes_away() {
        let frame = rejection_frame(&RoomError::Closed("rust".to_string()));
        assert_eq!(frame.code, close_code::AWAY);
        assert_eq!(frame.code, 1001);
        assert_eq!(frame.reason, "Room closed: rust");
    }

    #[tokio::test]
    async fn test_rejected_join_maps_to_close_frame() {
        let room = RoomHandle::spawn("tiny", 1, &HubConfig::default());
        let (tx, _rx) = mpsc::channel(16);
        room.register(Member::new(Uuid::new_v4(), "alice", tx))
            .await
            .unwrap();

        let full = ClientSession::new("bob", room.clone(), SessionConfig::default())
            .join()
            .await
            .err()
            .unwrap();
        assert_eq!(rejection_frame(&full).code, close_code::AGAIN);

        room.close().await;
        let closed = ClientSession::new("carol", room, SessionConfig::default())
            .join()
            .await
            .err()
            .unwrap();
        assert_eq!(rejection_frame(&closed).code, close_code::AWAY);
    }
}
