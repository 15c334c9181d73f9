//! Room Hub
//!
//! One task per room. The task owns the room's member set and applies
//! register, unregister, broadcast and close events strictly in mailbox order,
//! so membership needs no lock. Fan-out never waits on a member queue: a
//! member whose queue is full is disconnected, exactly as if it had left.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};

use super::error::{RoomError, RoomResult};
use super::message::{Message, SessionId, SharedMessage};

/// Configuration shared by every room hub
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Capacity of each hub's event mailbox
    pub mailbox_capacity: usize,
    /// Reject joins once membership reaches the room capacity
    pub enforce_capacity: bool,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 1024,
            enforce_capacity: true,
        }
    }
}

/// A session as registered with a hub
#[derive(Debug)]
pub struct Member {
    id: SessionId,
    nickname: String,
    queue: mpsc::Sender<SharedMessage>,
}

impl Member {
    /// `queue` is the producing half of the session's outbound queue.
    pub fn new(id: SessionId, nickname: impl Into<String>, queue: mpsc::Sender<SharedMessage>) -> Self {
        Self {
            id,
            nickname: nickname.into(),
            queue,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }
}

/// Events accepted by a hub's control loop
enum HubEvent {
    Register {
        member: Member,
        reply: oneshot::Sender<RoomResult<()>>,
    },
    Unregister(SessionId),
    Broadcast(SharedMessage),
    Members(oneshot::Sender<Vec<String>>),
    MemberCount(oneshot::Sender<usize>),
    Close,
}

#[derive(Debug)]
struct RoomInfo {
    name: String,
    capacity: usize,
    created_at: DateTime<Utc>,
}

/// Cloneable handle to a running room hub
///
/// Submitting events is the only way to reach the hub's state.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    info: Arc<RoomInfo>,
    events: mpsc::Sender<HubEvent>,
}

impl RoomHandle {
    /// Spawn the hub task for a new room and return its handle
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(name: impl Into<String>, capacity: usize, config: &HubConfig) -> Self {
        let info = Arc::new(RoomInfo {
            name: name.into(),
            capacity,
            created_at: Utc::now(),
        });
        let (events_tx, events_rx) = mpsc::channel(config.mailbox_capacity.max(1));

        let hub = RoomHub {
            name: info.name.clone(),
            capacity,
            enforce_capacity: config.enforce_capacity,
            members: HashMap::new(),
            events: events_rx,
        };
        tokio::spawn(hub.run());

        Self {
            info,
            events: events_tx,
        }
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn capacity(&self) -> usize {
        self.info.capacity
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.info.created_at
    }

    /// Add a member, waiting for the hub's decision
    pub async fn register(&self, member: Member) -> RoomResult<()> {
        let (reply, response) = oneshot::channel();
        self.submit(HubEvent::Register { member, reply }).await?;
        response.await.map_err(|_| self.closed_error())?
    }

    /// Remove a member and close its outbound queue
    pub async fn unregister(&self, id: SessionId) -> RoomResult<()> {
        self.submit(HubEvent::Unregister(id)).await
    }

    /// Queue a message for fan-out to every current member
    pub async fn broadcast(&self, message: Message) -> RoomResult<()> {
        self.submit(HubEvent::Broadcast(Arc::new(message))).await
    }

    /// Nicknames of the current members, sorted
    pub async fn members(&self) -> RoomResult<Vec<String>> {
        let (reply, response) = oneshot::channel();
        self.submit(HubEvent::Members(reply)).await?;
        response.await.map_err(|_| self.closed_error())
    }

    pub async fn member_count(&self) -> RoomResult<usize> {
        let (reply, response) = oneshot::channel();
        self.submit(HubEvent::MemberCount(reply)).await?;
        response.await.map_err(|_| self.closed_error())
    }

    /// Disconnect every member and stop the hub
    ///
    /// Returns once the hub task has dropped its mailbox.
    pub async fn close(&self) {
        if self.events.send(HubEvent::Close).await.is_ok() {
            self.events.closed().await;
        }
    }

    pub fn is_closed(&self) -> bool {
        self.events.is_closed()
    }

    async fn submit(&self, event: HubEvent) -> RoomResult<()> {
        self.events
            .send(event)
            .await
            .map_err(|_| self.closed_error())
    }

    fn closed_error(&self) -> RoomError {
        RoomError::Closed(self.info.name.clone())
    }
}

/// State owned by the hub task
struct RoomHub {
    name: String,
    capacity: usize,
    enforce_capacity: bool,
    members: HashMap<SessionId, Member>,
    events: mpsc::Receiver<HubEvent>,
}

impl RoomHub {
    async fn run(mut self) {
        tracing::info!(room = %self.name, capacity = self.capacity, "Room hub started");

        while let Some(event) = self.events.recv().await {
            match event {
                HubEvent::Register { member, reply } => self.register(member, reply),
                HubEvent::Unregister(id) => self.unregister(id),
                HubEvent::Broadcast(message) => self.fan_out(message, None),
                HubEvent::Members(reply) => {
                    let _ = reply.send(self.nicknames());
                }
                HubEvent::MemberCount(reply) => {
                    let _ = reply.send(self.members.len());
                }
                HubEvent::Close => {
                    self.close();
                    break;
                }
            }
        }

        tracing::info!(room = %self.name, "Room hub stopped");
    }

    fn register(&mut self, member: Member, reply: oneshot::Sender<RoomResult<()>>) {
        if self.members.contains_key(&member.id) {
            let _ = reply.send(Ok(()));
            return;
        }

        if self.enforce_capacity && self.members.len() >= self.capacity {
            tracing::info!(
                room = %self.name,
                session_id = %member.id,
                capacity = self.capacity,
                "Join rejected, room is full"
            );
            let _ = reply.send(Err(RoomError::Full {
                name: self.name.clone(),
                capacity: self.capacity,
            }));
            return;
        }

        let id = member.id;
        let notice = Arc::new(Message::joined(&member.nickname));
        tracing::info!(
            room = %self.name,
            session_id = %id,
            nickname = %member.nickname,
            members = self.members.len() + 1,
            "Member joined"
        );
        self.members.insert(id, member);
        let _ = reply.send(Ok(()));

        self.fan_out(notice, Some(id));
    }

    fn unregister(&mut self, id: SessionId) {
        // Dropping the member drops the queue sender, which ends its outbound pump.
        let Some(member) = self.members.remove(&id) else {
            return;
        };

        tracing::info!(
            room = %self.name,
            session_id = %id,
            nickname = %member.nickname,
            members = self.members.len(),
            "Member left"
        );
        self.fan_out(Arc::new(Message::left(&member.nickname)), None);
    }

    /// Deliver `message` to every member except `skip`
    ///
    /// Members that cannot take the message right now are removed, and their
    /// leave notices are delivered after it.
    fn fan_out(&mut self, message: SharedMessage, skip: Option<SessionId>) {
        let mut pending = VecDeque::from([(message, skip)]);

        while let Some((message, skip)) = pending.pop_front() {
            let mut dropped = Vec::new();

            for (id, member) in &self.members {
                if Some(*id) == skip {
                    continue;
                }
                match member.queue.try_send(Arc::clone(&message)) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        tracing::warn!(
                            room = %self.name,
                            session_id = %id,
                            nickname = %member.nickname,
                            "Outbound queue full, disconnecting member"
                        );
                        dropped.push(*id);
                    }
                    Err(TrySendError::Closed(_)) => {
                        tracing::debug!(
                            room = %self.name,
                            session_id = %id,
                            "Outbound queue closed, removing member"
                        );
                        dropped.push(*id);
                    }
                }
            }

            for id in dropped {
                if let Some(member) = self.members.remove(&id) {
                    pending.push_back((Arc::new(Message::left(&member.nickname)), None));
                }
            }
        }
    }

    fn close(&mut self) {
        let notice = Arc::new(Message::closing(&self.name));
        for member in self.members.values() {
            let _ = member.queue.try_send(Arc::clone(&notice));
        }

        let disconnected = self.members.len();
        self.members.clear();
        self.events.close();

        tracing::info!(room = %self.name, disconnected, "Room closed");
    }

    fn nicknames(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .members
            .values()
            .map(|member| member.nickname.clone())
            .collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::message::Author;
    use uuid::Uuid;

    fn member(nickname: &str, queue_capacity: usize) -> (Member, mpsc::Receiver<SharedMessage>) {
        let (tx, rx) = mpsc::channel(queue_capacity);
        (Member::new(Uuid::new_v4(), nickname, tx), rx)
    }

    fn drain(rx: &mut mpsc::Receiver<SharedMessage>) -> Vec<String> {
        let mut rendered = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            rendered.push(msg.render());
        }
        rendered
    }

    #[test]
    fn test_default_config() {
        let config = HubConfig::default();
        assert_eq!(config.mailbox_capacity, 1024);
        assert!(config.enforce_capacity);
    }

    #[tokio::test]
    async fn test_register_and_members() {
        let room = RoomHandle::spawn("general", 10, &HubConfig::default());
        let (alice, _alice_rx) = member("alice", 16);
        let (bob, _bob_rx) = member("bob", 16);

        room.register(alice).await.unwrap();
        room.register(bob).await.unwrap();

        assert_eq!(room.members().await.unwrap(), vec!["alice", "bob"]);
        assert_eq!(room.member_count().await.unwrap(), 2);
        assert_eq!(room.name(), "general");
        assert_eq!(room.capacity(), 10);
    }

    #[tokio::test]
    async fn test_join_notice_skips_joiner() {
        let room = RoomHandle::spawn("general", 10, &HubConfig::default());
        let (alice, mut alice_rx) = member("alice", 16);
        let (bob, mut bob_rx) = member("bob", 16);

        room.register(alice).await.unwrap();
        room.register(bob).await.unwrap();
        room.members().await.unwrap();

        assert_eq!(drain(&mut alice_rx), vec!["bob has joined"]);
        assert!(drain(&mut bob_rx).is_empty());
    }

    #[tokio::test]
    async fn test_broadcast_reaches_every_member() {
        let room = RoomHandle::spawn("general", 10, &HubConfig::default());
        let (alice, mut alice_rx) = member("alice", 16);
        let alice_id = alice.id();
        let (bob, mut bob_rx) = member("bob", 16);

        room.register(alice).await.unwrap();
        room.register(bob).await.unwrap();
        drain(&mut alice_rx);

        room.broadcast(Message::from_session(alice_id, "alice", b"hi".to_vec()))
            .await
            .unwrap();
        room.members().await.unwrap();

        let to_alice = alice_rx.try_recv().unwrap();
        let to_bob = bob_rx.try_recv().unwrap();
        assert_eq!(to_bob.payload(), b"hi");
        assert_eq!(to_bob.sender_id(), Some(alice_id));
        assert!(Arc::ptr_eq(&to_alice, &to_bob));
    }

    #[tokio::test]
    async fn test_unregister_closes_queue_and_announces() {
        let room = RoomHandle::spawn("general", 10, &HubConfig::default());
        let (alice, mut alice_rx) = member("alice", 16);
        let (bob, mut bob_rx) = member("bob", 16);
        let bob_id = bob.id();

        room.register(alice).await.unwrap();
        room.register(bob).await.unwrap();
        room.unregister(bob_id).await.unwrap();

        assert_eq!(room.members().await.unwrap(), vec!["alice"]);
        assert_eq!(room.member_count().await.unwrap(), 1);
        assert_eq!(drain(&mut alice_rx), vec!["bob has joined", "bob has left"]);
        // Queue closed: receiver reports end of stream once drained.
        assert!(bob_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_unregister_unknown_is_noop() {
        let room = RoomHandle::spawn("general", 10, &HubConfig::default());
        let (alice, mut alice_rx) = member("alice", 16);

        room.register(alice).await.unwrap();
        room.unregister(Uuid::new_v4()).await.unwrap();

        assert_eq!(room.members().await.unwrap(), vec!["alice"]);
        assert!(drain(&mut alice_rx).is_empty());
    }

    #[tokio::test]
    async fn test_capacity_enforced() {
        let room = RoomHandle::spawn("tiny", 1, &HubConfig::default());
        let (alice, _alice_rx) = member("alice", 16);
        let (bob, _bob_rx) = member("bob", 16);

        room.register(alice).await.unwrap();
        let result = room.register(bob).await;

        assert_eq!(
            result,
            Err(RoomError::Full {
                name: "tiny".to_string(),
                capacity: 1
            })
        );
        assert_eq!(room.members().await.unwrap(), vec!["alice"]);
    }

    #[tokio::test]
    async fn test_capacity_not_enforced_when_disabled() {
        let config = HubConfig {
            mailbox_capacity: 16,
            enforce_capacity: false,
        };
        let room = RoomHandle::spawn("tiny", 1, &config);
        let (alice, _alice_rx) = member("alice", 16);
        let (bob, _bob_rx) = member("bob", 16);

        room.register(alice).await.unwrap();
        room.register(bob).await.unwrap();

        assert_eq!(room.member_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_slow_member_is_disconnected() {
        let room = RoomHandle::spawn("general", 10, &HubConfig::default());
        let (fast, mut fast_rx) = member("fast", 64);
        let fast_id = fast.id();
        let (slow, mut slow_rx) = member("slow", 1);

        room.register(slow).await.unwrap();
        room.register(fast).await.unwrap();
        // "fast has joined" fills the slow member's only slot.

        for i in 0..10 {
            let payload = format!("msg {}", i).into_bytes();
            room.broadcast(Message::from_session(fast_id, "fast", payload))
                .await
                .unwrap();
        }
        assert_eq!(room.members().await.unwrap(), vec!["fast"]);

        let received = drain(&mut fast_rx);
        assert_eq!(received.len(), 11);
        assert_eq!(received[0], "fast: msg 0");
        assert_eq!(received[1], "slow has left");
        assert_eq!(received[10], "fast: msg 9");

        // The slow member keeps what it had buffered, then sees its queue closed.
        assert_eq!(slow_rx.recv().await.unwrap().render(), "fast has joined");
        assert!(slow_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_members_receive_identical_order() {
        let room = RoomHandle::spawn("general", 10, &HubConfig::default());
        let (alice, mut alice_rx) = member("alice", 512);
        let (bob, mut bob_rx) = member("bob", 512);
        room.register(alice).await.unwrap();
        room.register(bob).await.unwrap();
        drain(&mut alice_rx);

        let mut senders = Vec::new();
        for task in 0..4 {
            let room = room.clone();
            senders.push(tokio::spawn(async move {
                let id = Uuid::new_v4();
                for i in 0..50 {
                    let payload = format!("{}-{}", task, i).into_bytes();
                    room.broadcast(Message::from_session(id, "writer", payload))
                        .await
                        .unwrap();
                }
            }));
        }
        for sender in senders {
            sender.await.unwrap();
        }
        room.members().await.unwrap();

        let seen_by_alice = drain(&mut alice_rx);
        let seen_by_bob = drain(&mut bob_rx);
        assert_eq!(seen_by_alice.len(), 200);
        assert_eq!(seen_by_alice, seen_by_bob);

        // Per-writer order is preserved.
        let from_first: Vec<_> = seen_by_alice
            .iter()
            .filter(|line| line.starts_with("writer: 0-"))
            .cloned()
            .collect();
        let expected: Vec<_> = (0..50).map(|i| format!("writer: 0-{}", i)).collect();
        assert_eq!(from_first, expected);
    }

    #[tokio::test]
    async fn test_close_disconnects_everyone() {
        let room = RoomHandle::spawn("general", 10, &HubConfig::default());
        let (alice, mut alice_rx) = member("alice", 16);
        room.register(alice).await.unwrap();

        room.close().await;
        assert!(room.is_closed());

        let notice = alice_rx.recv().await.unwrap();
        assert_eq!(notice.author(), &Author::System);
        assert_eq!(notice.render(), "Room general is closing");
        assert!(alice_rx.recv().await.is_none());

        let (bob, _bob_rx) = member("bob", 16);
        assert_eq!(
            room.register(bob).await,
            Err(RoomError::Closed("general".to_string()))
        );
        assert!(room.members().await.is_err());
        assert!(room.member_count().await.is_err());
    }
}
