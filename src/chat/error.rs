//! Chat core error types
//!
//! Room-level errors are surfaced to callers of the registry and hub handles.
//! Session errors stay local to one connection and end only that session.

use std::time::Duration;
use thiserror::Error;

/// Errors raised by the registry and by room hub handles
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoomError {
    /// Lookup of a room name that is not registered
    #[error("Room not found: {0}")]
    NotFound(String),

    /// Creation of a room name that is already registered
    #[error("Room already exists: {0}")]
    AlreadyExists(String),

    /// Join rejected because membership reached the room capacity
    #[error("Room {name} is full (capacity: {capacity})")]
    Full { name: String, capacity: usize },

    /// The hub task has stopped and no longer accepts events
    #[error("Room closed: {0}")]
    Closed(String),
}

/// Errors that end a single client session
#[derive(Error, Debug)]
pub enum SessionError {
    /// Reading a frame from the connection failed
    #[error("Connection read error: {0}")]
    Read(String),

    /// Writing a frame to the connection failed
    #[error("Connection write error: {0}")]
    Write(String),

    /// Writing a frame did not complete in time
    #[error("Write timed out after {0:?}")]
    WriteTimeout(Duration),

    /// Peer sent a frame above the configured limit
    #[error("Message too large: {size} bytes (limit: {limit})")]
    MessageTooLarge { size: usize, limit: usize },

    /// The room stopped accepting events
    #[error("Room error: {0}")]
    Room(#[from] RoomError),
}

/// Result type for room operations
pub type RoomResult<T> = Result<T, RoomError>;
