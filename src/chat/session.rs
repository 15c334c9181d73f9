//! Client Session
//!
//! Bridges one connection to its room hub with two tasks. The inbound pump
//! turns frames into broadcasts; the outbound pump drains the session's queue
//! onto the wire. Whichever pump stops first makes the other stop: the
//! inbound pump unregisters, which closes the queue; the outbound pump fires
//! a oneshot that the inbound pump selects on.

use axum::extract::ws::Message as WsMessage;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use std::fmt::Display;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, timeout, Instant};
use uuid::Uuid;

use super::error::{RoomResult, SessionError};
use super::hub::{Member, RoomHandle};
use super::message::{Message, SessionId, SharedMessage};

/// Nickname used when a client does not provide one
pub const ANONYMOUS: &str = "Anonymous";

/// Per-session limits and timers
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Capacity of the outbound queue the hub fans out into
    pub outbound_capacity: usize,
    /// Largest accepted inbound payload in bytes
    pub max_message_size: usize,
    /// Deadline for a single frame write
    pub write_timeout: Duration,
    /// Interval between keepalive pings
    pub ping_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            outbound_capacity: 256,
            max_message_size: 4096,
            write_timeout: Duration::from_secs(10),
            ping_interval: Duration::from_secs(54),
        }
    }
}

/// Trimmed nickname, or [`ANONYMOUS`] when blank
pub fn normalize_nickname(nickname: &str) -> String {
    let trimmed = nickname.trim();
    if trimmed.is_empty() {
        ANONYMOUS.to_string()
    } else {
        trimmed.to_string()
    }
}

/// A client that has not joined its room yet
pub struct ClientSession {
    id: SessionId,
    nickname: String,
    room: RoomHandle,
    config: SessionConfig,
}

impl ClientSession {
    pub fn new(nickname: &str, room: RoomHandle, config: SessionConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            nickname: normalize_nickname(nickname),
            room,
            config,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    pub fn room(&self) -> &RoomHandle {
        &self.room
    }

    /// Register with the room
    ///
    /// Creates the outbound queue and hands its sender to the hub. Fails if
    /// the room is full or closed; nothing is left registered in that case.
    pub async fn join(self) -> RoomResult<JoinedSession> {
        let (queue_tx, queue_rx) = mpsc::channel(self.config.outbound_capacity.max(1));
        self.room
            .register(Member::new(self.id, self.nickname.clone(), queue_tx))
            .await?;

        Ok(JoinedSession {
            session: self,
            queue: queue_rx,
        })
    }
}

/// A registered session waiting for its connection pumps
pub struct JoinedSession {
    session: ClientSession,
    queue: mpsc::Receiver<SharedMessage>,
}

impl JoinedSession {
    pub fn id(&self) -> SessionId {
        self.session.id
    }

    pub fn nickname(&self) -> &str {
        &self.session.nickname
    }

    /// Launch the inbound and outbound pumps over the connection halves
    pub fn start<W, R, E>(self, sink: W, stream: R) -> SessionTasks
    where
        W: Sink<WsMessage> + Unpin + Send + 'static,
        W::Error: Display + Send,
        R: Stream<Item = Result<WsMessage, E>> + Unpin + Send + 'static,
        E: Display + Send,
    {
        let JoinedSession { session, queue } = self;
        let ClientSession {
            id,
            nickname,
            room,
            config,
        } = session;
        let (done_tx, done_rx) = oneshot::channel();

        let outbound = tokio::spawn(async move {
            if let Err(e) = outbound_pump(
                sink,
                queue,
                config.write_timeout,
                config.ping_interval,
                done_tx,
            )
            .await
            {
                tracing::debug!(session_id = %id, error = %e, "Outbound pump stopped");
            }
        });

        let inbound = tokio::spawn(async move {
            let result = inbound_pump(
                id,
                &nickname,
                &room,
                stream,
                config.max_message_size,
                done_rx,
            )
            .await;

            match result {
                Ok(()) => tracing::info!(
                    session_id = %id,
                    room = %room.name(),
                    nickname = %nickname,
                    "Session ended"
                ),
                Err(e) => tracing::info!(
                    session_id = %id,
                    room = %room.name(),
                    nickname = %nickname,
                    error = %e,
                    "Session ended with error"
                ),
            }
        });

        SessionTasks {
            id,
            inbound,
            outbound,
        }
    }
}

/// Join handles of a running session's pumps
pub struct SessionTasks {
    id: SessionId,
    inbound: JoinHandle<()>,
    outbound: JoinHandle<()>,
}

impl SessionTasks {
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Wait until both pumps have finished
    pub async fn wait(self) {
        let (inbound, outbound) = tokio::join!(self.inbound, self.outbound);
        for result in [inbound, outbound] {
            if let Err(e) = result {
                tracing::error!(session_id = %self.id, error = %e, "Session task failed");
            }
        }
    }
}

/// Read frames and submit them to the room until the connection ends
///
/// Always unregisters before returning.
async fn inbound_pump<R, E>(
    id: SessionId,
    nickname: &str,
    room: &RoomHandle,
    mut stream: R,
    max_message_size: usize,
    mut outbound_done: oneshot::Receiver<()>,
) -> Result<(), SessionError>
where
    R: Stream<Item = Result<WsMessage, E>> + Unpin,
    E: Display,
{
    let result = loop {
        let frame = tokio::select! {
            frame = stream.next() => frame,
            _ = &mut outbound_done => break Ok(()),
        };

        let payload = match frame {
            Some(Ok(WsMessage::Text(text))) => text.into_bytes(),
            Some(Ok(WsMessage::Binary(data))) => data,
            Some(Ok(WsMessage::Ping(_))) | Some(Ok(WsMessage::Pong(_))) => continue,
            Some(Ok(WsMessage::Close(_))) | None => break Ok(()),
            Some(Err(e)) => break Err(SessionError::Read(e.to_string())),
        };

        if payload.len() > max_message_size {
            break Err(SessionError::MessageTooLarge {
                size: payload.len(),
                limit: max_message_size,
            });
        }

        if let Err(e) = room
            .broadcast(Message::from_session(id, nickname, payload))
            .await
        {
            break Err(e.into());
        }
    };

    if let Err(e) = room.unregister(id).await {
        tracing::debug!(session_id = %id, error = %e, "Unregister after room closed");
    }
    result
}

/// Write queued messages and keepalive pings until the queue closes
///
/// Closes the sink and signals the inbound pump before returning.
async fn outbound_pump<W>(
    mut sink: W,
    mut queue: mpsc::Receiver<SharedMessage>,
    write_timeout: Duration,
    ping_interval: Duration,
    done: oneshot::Sender<()>,
) -> Result<(), SessionError>
where
    W: Sink<WsMessage> + Unpin,
    W::Error: Display,
{
    let mut ping = interval_at(Instant::now() + ping_interval, ping_interval);

    let result = loop {
        tokio::select! {
            next = queue.recv() => match next {
                Some(message) => {
                    let frame = WsMessage::Text(message.render());
                    if let Err(e) = write_frame(&mut sink, frame, write_timeout).await {
                        break Err(e);
                    }
                }
                None => break Ok(()),
            },
            _ = ping.tick() => {
                if let Err(e) = write_frame(&mut sink, WsMessage::Ping(Vec::new()), write_timeout).await {
                    break Err(e);
                }
            }
        }
    };

    let _ = timeout(write_timeout, sink.close()).await;
    let _ = done.send(());
    result
}

async fn write_frame<W>(sink: &mut W, frame: WsMessage, limit: Duration) -> Result<(), SessionError>
where
    W: Sink<WsMessage> + Unpin,
    W::Error: Display,
{
    match timeout(limit, sink.send(frame)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(SessionError::Write(e.to_string())),
        Err(_) => Err(SessionError::WriteTimeout(limit)),
    }
}
