//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::sync::Arc;
use std::time::Instant;

use crate::chat::{RoomRegistry, RoomResult, SessionConfig};
use crate::config::Config;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Directory of live rooms
    pub registry: Arc<RoomRegistry>,
    /// Limits and timers applied to every new session
    pub session_config: SessionConfig,
    /// Full server configuration
    pub config: Arc<Config>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    /// Create state with an empty registry
    pub fn new(config: Config) -> Self {
        let registry =
            RoomRegistry::with_default_room(config.chat.hub_config(), &config.chat.default_room);

        Self {
            registry: Arc::new(registry),
            session_config: config.chat.session_config(),
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Create state and the default room
    pub async fn initialize(config: Config) -> RoomResult<Self> {
        let state = Self::new(config);
        state
            .registry
            .create_room(&state.config.chat.default_room, state.config.chat.default_room_capacity)
            .await?;
        Ok(state)
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn default_room(&self) -> &str {
        self.registry.default_room()
    }
}
