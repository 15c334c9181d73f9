//! Room Routes
//!
//! Directory and lifecycle endpoints for chat rooms.
//!
//! - GET /api/v1/rooms - List all rooms
//! - POST /api/v1/rooms - Create a room
//! - GET /api/v1/rooms/:name - Get a room and its members
//! - DELETE /api/v1/rooms/:name - Close a room and disconnect its members

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{CreateRoomRequest, RoomDetail, RoomListResponse, RoomSummary};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::chat::RoomHandle;

/// GET /api/v1/rooms
///
/// List all rooms with their current member counts.
pub async fn list_rooms(State(state): State<Arc<AppState>>) -> Json<RoomListResponse> {
    let mut rooms = Vec::new();
    for room in state.registry.list_rooms().await {
        // A room closed between listing and counting just shows as empty.
        let members = room.member_count().await.unwrap_or(0);
        rooms.push(RoomSummary {
            name: room.name().to_string(),
            capacity: room.capacity(),
            members,
            created_at: room.created_at(),
        });
    }

    Json(RoomListResponse {
        default_room: state.default_room().to_string(),
        total: rooms.len(),
        rooms,
    })
}

/// POST /api/v1/rooms
///
/// Create a room. The name is trimmed, must not be blank and must work as a
/// single URL path segment; the capacity must be at least 1.
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateRoomRequest>,
) -> ApiResult<(StatusCode, Json<RoomDetail>)> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("Room name must not be blank".to_string()));
    }
    if name.contains('/') || name == "." || name == ".." {
        return Err(ApiError::Validation(format!(
            "Room name cannot be used as a path segment: {}",
            name
        )));
    }
    if req.capacity < 1 {
        return Err(ApiError::Validation(format!(
            "Room capacity must be at least 1, got {}",
            req.capacity
        )));
    }
    let capacity = usize::try_from(req.capacity)
        .map_err(|_| ApiError::Validation(format!("Room capacity too large: {}", req.capacity)))?;

    let room = state.registry.create_room(name, capacity).await?;

    Ok((StatusCode::CREATED, Json(room_detail(&room, Vec::new()))))
}

/// GET /api/v1/rooms/:name
///
/// Get a room with its member nicknames.
pub async fn get_room(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<Json<RoomDetail>> {
    let room = state.registry.lookup_room(&name).await?;
    let members = room.members().await?;

    Ok(Json(room_detail(&room, members)))
}

/// DELETE /api/v1/rooms/:name
///
/// Close a room. Its members receive a closing notice and are disconnected.
/// The default room cannot be deleted.
pub async fn delete_room(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<StatusCode> {
    if name == state.default_room() {
        return Err(ApiError::Validation(format!(
            "The default room '{}' cannot be deleted",
            name
        )));
    }

    state.registry.remove_room(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn room_detail(room: &RoomHandle, members: Vec<String>) -> RoomDetail {
    RoomDetail {
        name: room.name().to_string(),
        capacity: room.capacity(),
        members,
        created_at: room.created_at(),
    }
}
