//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    infrastructure::dto::http::{CreateRoomRequest, RoomDebugDto, RoomInfoDto},
    ui::state::AppState,
};

/// Create a new room hosted by the given display name
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateRoomRequest>,
) -> (StatusCode, Json<RoomInfoDto>) {
    let room = state.create_room_usecase.execute(request.host_name).await;

    // Domain Model から DTO への変換
    (StatusCode::CREATED, Json(RoomInfoDto::from(room)))
}

/// Get room metadata by ID
pub async fn get_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomInfoDto>, StatusCode> {
    match state.get_room_usecase.execute(&room_id).await {
        Ok(room) => Ok(Json(RoomInfoDto::from(room))),
        Err(e) => {
            tracing::warn!("Room lookup failed: {}", e);
            Err(StatusCode::NOT_FOUND)
        }
    }
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Debug endpoint to snapshot all room metadata (for testing purposes)
pub async fn debug_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomDebugDto>> {
    let rooms = state.get_room_usecase.list().await;
    Json(rooms.into_iter().map(RoomDebugDto::from).collect())
}
