//! # Chatroom
//!
//! Real-time room-based chat server. Clients connect over WebSocket, join a
//! named room and exchange messages with everyone else in that room.
//!
//! ## Modules
//!
//! - [`chat`]: Room registry, per-room broadcast hubs and client sessions
//! - [`websocket`]: WebSocket upgrade into a chat session
//! - [`api`]: REST API server with Axum (room directory, health)
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chatroom::chat::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = RoomRegistry::new(HubConfig::default());
//!
//!     // Create the default room and one more
//!     registry.create_room(DEFAULT_ROOM, 100).await?;
//!     registry.create_room("rust", 10).await?;
//!
//!     // Resolve the room a client asked for; blank means the default room
//!     let room = registry.resolve(Some("rust")).await?;
//!
//!     // Register a session; its pumps are started once a connection exists
//!     let session = ClientSession::new("alice", room.clone(), SessionConfig::default());
//!     let _joined = session.join().await?;
//!
//!     println!("{} members in {}", room.member_count().await?, room.name());
//!
//!     // Graceful shutdown
//!     registry.shutdown().await;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod chat;
pub mod config;
pub mod websocket;

// Re-export top-level types for convenience
pub use chat::{
    ClientSession, HubConfig, Message, RoomError, RoomHandle, RoomRegistry, RoomResult,
    SessionConfig, SessionError,
};

pub use api::{build_router, serve, ApiError, AppState};

pub use websocket::websocket_handler;

pub use config::{ChatConfig, Config, ConfigError, LoggingConfig, ServerConfig};
