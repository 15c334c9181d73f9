//! Chat Core
//!
//! The concurrency engine behind the chat server.
//!
//! ## Architecture
//!
//! - **RoomRegistry**: room name → hub handle, behind a read-write lock
//! - **RoomHub**: one task per room owning the member set; every register,
//!   unregister and broadcast goes through its mailbox in arrival order
//! - **ClientSession**: one per connection, with an inbound and an outbound
//!   pump bridging the socket to the hub
//! - **Message**: author + opaque payload, shared between recipients
//!
//! Data flow: frame → inbound pump → hub mailbox → fan-out → member queues →
//! outbound pumps → frames.

mod error;
mod hub;
mod message;
mod registry;
mod session;

pub use error::{RoomError, RoomResult, SessionError};
pub use hub::{HubConfig, Member, RoomHandle};
pub use message::{Author, Message, SessionId, SharedMessage};
pub use registry::{RoomRegistry, DEFAULT_ROOM};
pub use session::{
    normalize_nickname, ClientSession, JoinedSession, SessionConfig, SessionTasks, ANONYMOUS,
};
