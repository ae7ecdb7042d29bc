//! Room actor: one Tokio task per live room.
//!
//! Every event for a room, whether from a client, a timer, or a
//! disconnect, arrives as a [`RoomCommand`] on one bounded channel and is
//! handled to completion before the next. [`RoomHandle`] is the cheap,
//! cloneable front door.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use buzzline_protocol::{Recipient, RoomCode, ServerEvent, ViewSnapshot};
use buzzline_timer::TimerScheduler;
use buzzline_transport::ConnectionId;
use tokio::sync::{mpsc, oneshot};

use crate::controller::{Effects, RoomEvent, SessionController, TimerEvent};
use crate::registry::RoomTable;
use crate::{ContentProvider, MatchConfig, MatchPhase, MatchSession, RoomError};

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

/// Outbound queue of one connection. The connection's writer task drains it.
pub type ConnectionSender = mpsc::UnboundedSender<ServerEvent>;

pub(crate) enum RoomCommand {
    Event {
        origin: ConnectionId,
        reply_to: ConnectionSender,
        event: RoomEvent,
        /// Told whether the origin joined the room's channel.
        joined: Option<oneshot::Sender<bool>>,
    },
    Timer(TimerEvent),
    Disconnect {
        conn: ConnectionId,
    },
    IsPlayerPresent {
        name: String,
        reply: oneshot::Sender<bool>,
    },
    GetInfo {
        reply: oneshot::Sender<RoomInfo>,
    },
    Snapshot {
        reply: oneshot::Sender<ViewSnapshot>,
    },
    Shutdown,
}

/// Summary of a room for inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub room_code: RoomCode,
    pub phase: MatchPhase,
    pub round: u32,
    pub player_count: usize,
    pub max_players: usize,
    pub has_board: bool,
}

/// Cheap handle to a running room.
#[derive(Clone)]
pub struct RoomHandle {
    room_code: RoomCode,
    instance: u64,
    sender: mpsc::Sender<RoomCommand>,
}

impl std::fmt::Debug for RoomHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomHandle")
            .field("room_code", &self.room_code)
            .field("instance", &self.instance)
            .finish()
    }
}

impl RoomHandle {
    pub fn room_code(&self) -> &RoomCode {
        &self.room_code
    }

    pub(crate) fn instance(&self) -> u64 {
        self.instance
    }

    fn unavailable(&self) -> RoomError {
        RoomError::Unavailable(self.room_code.clone())
    }

    async fn send(&self, cmd: RoomCommand) -> Result<(), RoomError> {
        self.sender.send(cmd).await.map_err(|_| self.unavailable())
    }

    /// Queues a client event. Replies addressed to the origin go to
    /// `reply_to`, even if the connection never subscribes.
    pub async fn send_event(
        &self,
        origin: ConnectionId,
        reply_to: ConnectionSender,
        event: RoomEvent,
    ) -> Result<(), RoomError> {
        self.send(RoomCommand::Event {
            origin,
            reply_to,
            event,
            joined: None,
        })
        .await
    }

    /// Queues a board or player join and waits for the room's verdict.
    ///
    /// `Ok(false)` means the room turned the connection away and already
    /// told it so.
    pub async fn attach(
        &self,
        origin: ConnectionId,
        reply_to: ConnectionSender,
        event: RoomEvent,
    ) -> Result<bool, RoomError> {
        let (joined, rx) = oneshot::channel();
        self.send(RoomCommand::Event {
            origin,
            reply_to,
            event,
            joined: Some(joined),
        })
        .await?;
        rx.await.map_err(|_| self.unavailable())
    }

    /// Reports that `conn` has gone away.
    pub async fn disconnect(&self, conn: ConnectionId) -> Result<(), RoomError> {
        self.send(RoomCommand::Disconnect { conn }).await
    }

    pub async fn is_player_present(&self, name: &str) -> Result<bool, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::IsPlayerPresent {
            name: name.to_owned(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| self.unavailable())
    }

    pub async fn get_info(&self) -> Result<RoomInfo, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::GetInfo { reply }).await?;
        rx.await.map_err(|_| self.unavailable())
    }

    /// The same view `updateGame` carries.
    pub async fn snapshot(&self) -> Result<ViewSnapshot, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::Snapshot { reply }).await?;
        rx.await.map_err(|_| self.unavailable())
    }

    /// Non-blocking shutdown for callers holding the registry lock.
    pub(crate) fn try_shutdown(&self) {
        if self.sender.try_send(RoomCommand::Shutdown).is_err() {
            tracing::debug!(room = %self.room_code, "shutdown not queued; room closing on its own");
        }
    }
}

struct RoomActor<P> {
    room_code: RoomCode,
    instance: u64,
    controller: SessionController<P>,
    members: BTreeMap<ConnectionId, ConnectionSender>,
    timers: TimerScheduler<RoomCommand>,
    rooms: RoomTable,
    max_players: usize,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl<P: ContentProvider> RoomActor<P> {
    async fn run(mut self) {
        tracing::info!(room = %self.room_code, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            let teardown = match cmd {
                RoomCommand::Event {
                    origin,
                    reply_to,
                    event,
                    joined,
                } => {
                    tracing::trace!(room = %self.room_code, conn = %origin, ?event, "room event");
                    let fx = self.controller.handle(origin, event).await;
                    let subscribed = fx.subscribe;
                    let teardown = self.apply(Some((origin, &reply_to)), fx);
                    if let Some(joined) = joined {
                        let _ = joined.send(subscribed);
                    }
                    teardown
                }
                RoomCommand::Timer(timer) => {
                    let fx = self.controller.on_timer(timer).await;
                    self.apply(None, fx)
                }
                RoomCommand::Disconnect { conn } => {
                    let fx = self.controller.on_disconnect(conn);
                    self.members.remove(&conn);
                    self.apply(None, fx)
                }
                RoomCommand::IsPlayerPresent { name, reply } => {
                    let _ = reply.send(self.controller.session().is_player_present(&name));
                    false
                }
                RoomCommand::GetInfo { reply } => {
                    let _ = reply.send(self.info());
                    false
                }
                RoomCommand::Snapshot { reply } => {
                    let _ = reply.send(self.controller.session().view_snapshot());
                    false
                }
                RoomCommand::Shutdown => {
                    tracing::info!(room = %self.room_code, "room shutting down");
                    break;
                }
            };

            if teardown {
                self.unregister().await;
                break;
            }
        }

        tracing::info!(room = %self.room_code, "room actor stopped");
    }

    /// Applies effects in order and returns whether the room must close.
    ///
    /// `origin` is `None` for timers and disconnects, which have nobody to
    /// reply to.
    fn apply(&mut self, origin: Option<(ConnectionId, &ConnectionSender)>, fx: Effects) -> bool {
        if fx.subscribe {
            if let Some((conn, tx)) = origin {
                self.members.insert(conn, tx.clone());
            }
        }

        for (recipient, event) in fx.outbound {
            match recipient {
                Recipient::Room => {
                    for tx in self.members.values() {
                        let _ = tx.send(event.clone());
                    }
                }
                Recipient::Origin => {
                    if let Some((_, tx)) = origin {
                        let _ = tx.send(event);
                    }
                }
                Recipient::Connection(conn) => {
                    if let Some(tx) = self.members.get(&conn) {
                        let _ = tx.send(event);
                    }
                }
            }
        }

        if let Some(conn) = fx.unsubscribe {
            self.members.remove(&conn);
        }

        for (delay, timer) in fx.timers {
            self.timers.schedule(delay, RoomCommand::Timer(timer));
        }

        fx.teardown
    }

    /// Removes this room from the shared table, unless the code has
    /// already been handed to a newer room.
    async fn unregister(&mut self) {
        let mut rooms = self.rooms.lock().await;
        if rooms
            .get(&self.room_code)
            .is_some_and(|h| h.instance() == self.instance)
        {
            rooms.remove(&self.room_code);
            tracing::info!(room = %self.room_code, rooms = rooms.len(), "room destroyed");
        }
        self.members.clear();
    }

    fn info(&self) -> RoomInfo {
        let session = self.controller.session();
        RoomInfo {
            room_code: self.room_code.clone(),
            phase: session.phase(),
            round: session.round(),
            player_count: session.roster().len(),
            max_players: self.max_players,
            has_board: session.board_connection().is_some(),
        }
    }
}

pub(crate) fn spawn_room<P: ContentProvider>(
    room_code: RoomCode,
    provider: Arc<P>,
    config: MatchConfig,
    rooms: RoomTable,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(config.channel_size);
    let instance = NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed);

    let session = MatchSession::new(room_code.clone(), config.final_round);
    let actor = RoomActor {
        room_code: room_code.clone(),
        instance,
        max_players: config.max_players,
        controller: SessionController::new(session, provider, config),
        members: BTreeMap::new(),
        timers: TimerScheduler::new(tx.downgrade()),
        rooms,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle {
        room_code,
        instance,
        sender: tx,
    }
}
