//! Room Registry
//!
//! Server-wide directory of room name → hub handle. Lookups share a read
//! lock; creation takes the write lock and performs the existence check and
//! the insert under that single acquisition, so two concurrent creators of
//! the same name can never both succeed.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::error::{RoomError, RoomResult};
use super::hub::{HubConfig, RoomHandle};

/// Name of the room used when a client does not ask for one
pub const DEFAULT_ROOM: &str = "general";

/// Directory of live rooms
pub struct RoomRegistry {
    rooms: RwLock<HashMap<String, RoomHandle>>,
    hub_config: HubConfig,
    default_room: String,
}

impl RoomRegistry {
    /// Create an empty registry using [`DEFAULT_ROOM`] as the default room name
    pub fn new(hub_config: HubConfig) -> Self {
        Self::with_default_room(hub_config, DEFAULT_ROOM)
    }

    /// Create an empty registry with a custom default room name
    ///
    /// The default room itself is not created here; see [`Self::create_room`].
    pub fn with_default_room(hub_config: HubConfig, default_room: impl Into<String>) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            hub_config,
            default_room: default_room.into(),
        }
    }

    pub fn default_room(&self) -> &str {
        &self.default_room
    }

    /// Create a room and start its hub
    ///
    /// Fails with [`RoomError::AlreadyExists`] if the name is taken; the
    /// existing room is left untouched.
    pub async fn create_room(&self, name: &str, capacity: usize) -> RoomResult<RoomHandle> {
        let mut rooms = self.rooms.write().await;

        match rooms.entry(name.to_string()) {
            Entry::Occupied(_) => {
                tracing::debug!(room = %name, "Room already exists");
                Err(RoomError::AlreadyExists(name.to_string()))
            }
            Entry::Vacant(slot) => {
                let handle = RoomHandle::spawn(name, capacity, &self.hub_config);
                slot.insert(handle.clone());
                tracing::info!(room = %name, capacity, "Room created");
                Ok(handle)
            }
        }
    }

    /// Find a room by exact name
    pub async fn lookup_room(&self, name: &str) -> RoomResult<RoomHandle> {
        self.rooms
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| RoomError::NotFound(name.to_string()))
    }

    /// Resolve the room a client asked for
    ///
    /// An absent or blank name means the default room. Any other name must
    /// exist; there is no fallback to the default room.
    pub async fn resolve(&self, name: Option<&str>) -> RoomResult<RoomHandle> {
        match name.map(str::trim) {
            None | Some("") => self.lookup_room(&self.default_room).await,
            Some(name) => self.lookup_room(name).await,
        }
    }

    /// All rooms, ordered by name
    pub async fn list_rooms(&self) -> Vec<RoomHandle> {
        let mut rooms: Vec<RoomHandle> = self.rooms.read().await.values().cloned().collect();
        rooms.sort_by(|a, b| a.name().cmp(b.name()));
        rooms
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Total members across all rooms
    pub async fn session_count(&self) -> usize {
        let mut total = 0;
        for room in self.list_rooms().await {
            total += room.member_count().await.unwrap_or(0);
        }
        total
    }

    /// Remove a room and close its hub, disconnecting its members
    pub async fn remove_room(&self, name: &str) -> RoomResult<()> {
        let handle = self
            .rooms
            .write()
            .await
            .remove(name)
            .ok_or_else(|| RoomError::NotFound(name.to_string()))?;

        handle.close().await;
        tracing::info!(room = %name, "Room removed");
        Ok(())
    }

    /// Close every room
    pub async fn shutdown(&self) {
        let rooms: Vec<RoomHandle> = self.rooms.write().await.drain().map(|(_, h)| h).collect();
        let count = rooms.len();

        for room in rooms {
            room.close().await;
        }

        tracing::info!(rooms = count, "All rooms closed");
    }
}
