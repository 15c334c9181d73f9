//! Chat message values
//!
//! A [`Message`] is built once by an inbound pump (or by a hub for system
//! notices) and then shared read-only between every recipient queue.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Unique identifier for a client session
pub type SessionId = Uuid;

/// A message as it travels through hub fan-out
pub type SharedMessage = Arc<Message>;

/// Who produced a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Author {
    /// Notices synthesized by the room itself (joins, leaves, shutdown)
    System,
    /// A connected client
    Session { id: SessionId, nickname: String },
}

/// Immutable chat message: author plus opaque payload
#[derive(Debug, Clone)]
pub struct Message {
    author: Author,
    payload: Vec<u8>,
    sent_at: DateTime<Utc>,
}

impl Message {
    /// Message sent by a client session
    pub fn from_session(id: SessionId, nickname: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            author: Author::Session {
                id,
                nickname: nickname.into(),
            },
            payload,
            sent_at: Utc::now(),
        }
    }

    /// Plain-text notice from the room
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            author: Author::System,
            payload: text.into().into_bytes(),
            sent_at: Utc::now(),
        }
    }

    pub fn joined(nickname: &str) -> Self {
        Self::system(format!("{} has joined", nickname))
    }

    pub fn left(nickname: &str) -> Self {
        Self::system(format!("{} has left", nickname))
    }

    pub fn closing(room: &str) -> Self {
        Self::system(format!("Room {} is closing", room))
    }

    pub fn author(&self) -> &Author {
        &self.author
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn sent_at(&self) -> DateTime<Utc> {
        self.sent_at
    }

    /// Session id of the author, `None` for system notices
    pub fn sender_id(&self) -> Option<SessionId> {
        match &self.author {
            Author::System => None,
            Author::Session { id, .. } => Some(*id),
        }
    }

    pub fn is_system(&self) -> bool {
        matches!(self.author, Author::System)
    }

    /// Text written to the wire for this message
    ///
    /// Client messages are prefixed with the author's nickname; notices are
    /// sent as-is. Non-UTF-8 payload bytes are replaced.
    pub fn render(&self) -> String {
        let text = String::from_utf8_lossy(&self.payload);
        match &self.author {
            Author::System => text.into_owned(),
            Author::Session { nickname, .. } => format!("{}: {}", nickname, text),
        }
    }
}
