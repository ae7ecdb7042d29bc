//! Connection-level routing.
//!
//! The lobby sits between a connection and the rooms. It answers the two
//! registry-level events (`newGame`, `joining`) itself and forwards every
//! other event to the room actor named in it. It also remembers which room
//! a connection attached to, so a dropped socket can be reported there.

use buzzline_protocol::{ClientEvent, RoomCode, ServerEvent};
use buzzline_room::{ConnectionSender, ContentProvider, RoomEvent, RoomRegistry};
use buzzline_transport::ConnectionId;
use tracing::debug;

/// Reply text for `joining` when the code names no live room.
pub const NO_SUCH_ROOM: &str = "no room with that id found";
/// Reply text for `joining` when the name is already seated.
pub const NAME_TAKEN: &str = "name already taken";

/// Per-connection state the lobby needs.
#[derive(Debug)]
pub struct ClientContext {
    id: ConnectionId,
    outbound: ConnectionSender,
    attached: Option<RoomCode>,
}

impl ClientContext {
    pub fn new(id: ConnectionId, outbound: ConnectionSender) -> Self {
        Self {
            id,
            outbound,
            attached: None,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// The room this connection last attached to as board or player.
    pub fn attached(&self) -> Option<&RoomCode> {
        self.attached.as_ref()
    }

    fn reply(&self, event: ServerEvent) {
        // The writer only goes away with the connection itself.
        let _ = self.outbound.send(event);
    }
}

/// Routes client events for every connection of one server.
pub struct Lobby<P> {
    registry: RoomRegistry<P>,
}

impl<P> Clone for Lobby<P> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
        }
    }
}

impl<P: ContentProvider> Lobby<P> {
    pub fn new(registry: RoomRegistry<P>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &RoomRegistry<P> {
        &self.registry
    }

    /// Handles one decoded event from `ctx`'s connection.
    pub async fn route(&self, ctx: &mut ClientContext, event: ClientEvent) {
        let kind = event.name();
        match event {
            ClientEvent::NewGame => {
                let room_code = self.registry.create_room().await;
                ctx.reply(ServerEvent::NewGameCreated { room_code });
            }
            ClientEvent::Joining { room, name } => {
                let reply = match self.present(&room, &name).await {
                    None => ServerEvent::ErrorMessage {
                        text: NO_SUCH_ROOM.into(),
                    },
                    Some(true) => ServerEvent::ErrorMessage {
                        text: NAME_TAKEN.into(),
                    },
                    Some(false) => ServerEvent::JoinConfirmed,
                };
                ctx.reply(reply);
            }
            ClientEvent::NewDisplayJoin { room } => {
                self.attach(ctx, room, RoomEvent::NewDisplayJoin).await;
            }
            ClientEvent::NewPlayerJoin { room, name } => {
                if name.trim().is_empty() {
                    debug!(conn = %ctx.id, "player join without a name");
                    ctx.reply(ServerEvent::JoinError);
                    return;
                }
                self.attach(ctx, room, RoomEvent::NewPlayerJoin { name }).await;
            }
            ClientEvent::Kick { room, player } => {
                self.forward(ctx, &room, RoomEvent::Kick { player }, kind).await;
            }
            ClientEvent::Start { room } => {
                self.forward(ctx, &room, RoomEvent::Start, kind).await;
            }
            ClientEvent::ClueChosen {
                room,
                category_id,
                clue_id,
            } => {
                let event = RoomEvent::ClueChosen {
                    category_id,
                    clue_id,
                };
                self.forward(ctx, &room, event, kind).await;
            }
            ClientEvent::Buzz { room, name } => {
                self.forward(ctx, &room, RoomEvent::Buzz { name }, kind).await;
            }
            ClientEvent::Answer { room, answer } => {
                self.forward(ctx, &room, RoomEvent::Answer { answer }, kind).await;
            }
            ClientEvent::PlayerCorrect { room } => {
                self.forward(ctx, &room, RoomEvent::PlayerCorrect, kind).await;
            }
            ClientEvent::PlayerIncorrect { room } => {
                self.forward(ctx, &room, RoomEvent::PlayerIncorrect, kind).await;
            }
        }
    }

    /// Reports a closed connection to the room it was attached to.
    pub async fn disconnect(&self, ctx: &ClientContext) {
        let Some(code) = ctx.attached.as_ref() else {
            return;
        };
        if let Some(handle) = self.registry.find(code).await {
            if let Err(err) = handle.disconnect(ctx.id).await {
                debug!(room = %code, conn = %ctx.id, %err, "room gone before disconnect");
            }
        }
    }

    /// `None` if the room does not exist, else whether `name` is seated.
    async fn present(&self, room: &RoomCode, name: &str) -> Option<bool> {
        let handle = self.registry.find(room).await?;
        handle.is_player_present(name).await.ok()
    }

    async fn attach(&self, ctx: &mut ClientContext, room: RoomCode, event: RoomEvent) {
        if room.is_empty() {
            debug!(conn = %ctx.id, "attach without a room code");
            ctx.reply(ServerEvent::JoinError);
            return;
        }
        let Some(handle) = self.registry.find(&room).await else {
            debug!(room = %room, conn = %ctx.id, "attach to unknown room");
            ctx.reply(ServerEvent::JoinError);
            return;
        };

        match handle.attach(ctx.id, ctx.outbound.clone(), event).await {
            Ok(true) => {}
            Ok(false) => return,
            Err(err) => {
                debug!(room = %room, conn = %ctx.id, %err, "room stopped before attach");
                ctx.reply(ServerEvent::JoinError);
                return;
            }
        }

        if let Some(previous) = ctx.attached.replace(room.clone()) {
            if previous != room {
                self.leave(ctx.id, &previous).await;
            }
        }
    }

    async fn forward(&self, ctx: &ClientContext, room: &RoomCode, event: RoomEvent, kind: &str) {
        let Some(handle) = self.registry.find(room).await else {
            debug!(room = %room, conn = %ctx.id, event = kind, "event for unknown room dropped");
            return;
        };
        if let Err(err) = handle.send_event(ctx.id, ctx.outbound.clone(), event).await {
            debug!(room = %room, conn = %ctx.id, %err, "room stopped before event");
        }
    }

    async fn leave(&self, conn: ConnectionId, room: &RoomCode) {
        if let Some(handle) = self.registry.find(room).await {
            let _ = handle.disconnect(conn).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buzzline_room::{CategoryColumn, ContentError, FinalClue, MatchConfig};
    use tokio::sync::mpsc;

    struct NoContent;

    impl ContentProvider for NoContent {
        async fn fetch_board(
            &self,
            round: u32,
            _: i32,
        ) -> Result<Vec<CategoryColumn>, ContentError> {
            Err(ContentError::UnsupportedRound(round))
        }

        async fn fetch_final_clue(&self, _: i32) -> Result<FinalClue, ContentError> {
            Err(ContentError::UnsupportedRound(3))
        }
    }

    fn lobby() -> Lobby<NoContent> {
        Lobby::new(RoomRegistry::new(NoContent, MatchConfig::default()))
    }

    fn client(id: u64) -> (ClientContext, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ClientContext::new(ConnectionId::new(id), tx), rx)
    }

    async fn new_room(lobby: &Lobby<NoContent>) -> RoomCode {
        let (mut ctx, mut rx) = client(100);
        lobby.route(&mut ctx, ClientEvent::NewGame).await;
        match rx.recv().await {
            Some(ServerEvent::NewGameCreated { room_code }) => room_code,
            other => panic!("expected newGameCreated, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_new_game_replies_with_code() {
        let lobby = lobby();
        let code = new_room(&lobby).await;
        assert!(code.is_well_formed());
        assert!(lobby.registry().find(&code).await.is_some());
    }

    #[tokio::test]
    async fn test_joining_unknown_room() {
        let lobby = lobby();
        let (mut ctx, mut rx) = client(1);
        lobby
            .route(
                &mut ctx,
                ClientEvent::Joining {
                    room: RoomCode::from("NOPENO"),
                    name: "Alice".into(),
                },
            )
            .await;
        assert_eq!(
            rx.recv().await,
            Some(ServerEvent::ErrorMessage {
                text: NO_SUCH_ROOM.into()
            })
        );
    }

    #[tokio::test]
    async fn test_joining_checks_name_without_seating() {
        let lobby = lobby();
        let room = new_room(&lobby).await;

        let (mut alice, mut alice_rx) = client(1);
        lobby
            .route(
                &mut alice,
                ClientEvent::Joining {
                    room: room.clone(),
                    name: "Alice".into(),
                },
            )
            .await;
        assert_eq!(alice_rx.recv().await, Some(ServerEvent::JoinConfirmed));

        lobby
            .route(
                &mut alice,
                ClientEvent::NewPlayerJoin {
                    room: room.clone(),
                    name: "Alice".into(),
                },
            )
            .await;
        assert!(matches!(alice_rx.recv().await, Some(ServerEvent::NewPlayers { .. })));
        assert_eq!(alice.attached(), Some(&room));

        let (mut other, mut other_rx) = client(2);
        lobby
            .route(
                &mut other,
                ClientEvent::Joining {
                    room,
                    name: "Alice".into(),
                },
            )
            .await;
        assert_eq!(
            other_rx.recv().await,
            Some(ServerEvent::ErrorMessage {
                text: NAME_TAKEN.into()
            })
        );
        assert_eq!(other.attached(), None);
    }

    #[tokio::test]
    async fn test_attach_errors() {
        let lobby = lobby();
        let (mut ctx, mut rx) = client(1);

        lobby
            .route(
                &mut ctx,
                ClientEvent::NewDisplayJoin {
                    room: RoomCode::from("NOPENO"),
                },
            )
            .await;
        assert_eq!(rx.recv().await, Some(ServerEvent::JoinError));

        lobby
            .route(
                &mut ctx,
                ClientEvent::NewPlayerJoin {
                    room: RoomCode::from(""),
                    name: "Alice".into(),
                },
            )
            .await;
        assert_eq!(rx.recv().await, Some(ServerEvent::JoinError));

        let room = new_room(&lobby).await;
        lobby
            .route(
                &mut ctx,
                ClientEvent::NewPlayerJoin {
                    room,
                    name: String::new(),
                },
            )
            .await;
        assert_eq!(rx.recv().await, Some(ServerEvent::JoinError));
        assert_eq!(ctx.attached(), None);
    }

    #[tokio::test]
    async fn test_disconnect_reaches_room() {
        let lobby = lobby();
        let room = new_room(&lobby).await;

        let (mut board, mut board_rx) = client(1);
        lobby
            .route(&mut board, ClientEvent::NewDisplayJoin { room: room.clone() })
            .await;
        let (mut alice, _alice_rx) = client(2);
        lobby
            .route(
                &mut alice,
                ClientEvent::NewPlayerJoin {
                    room: room.clone(),
                    name: "Alice".into(),
                },
            )
            .await;
        assert!(matches!(board_rx.recv().await, Some(ServerEvent::NewPlayers { .. })));

        lobby.disconnect(&alice).await;
        assert!(matches!(
            board_rx.recv().await,
            Some(ServerEvent::NewPlayers { players }) if players.is_empty()
        ));
        assert_eq!(board_rx.recv().await, Some(ServerEvent::GameError));
    }

    async fn join(
        lobby: &Lobby<NoContent>,
        ctx: &mut ClientContext,
        room: &RoomCode,
        name: &str,
    ) {
        let event = ClientEvent::NewPlayerJoin {
            room: room.clone(),
            name: name.into(),
        };
        lobby.route(ctx, event).await;
    }

    #[tokio::test]
    async fn test_rejected_join_keeps_current_seat() {
        let lobby = lobby();
        let home = new_room(&lobby).await;
        let away = new_room(&lobby).await;

        let (mut board, mut board_rx) = client(1);
        lobby
            .route(&mut board, ClientEvent::NewDisplayJoin { room: home.clone() })
            .await;
        let (mut alice, mut alice_rx) = client(2);
        join(&lobby, &mut alice, &home, "Alice").await;
        assert!(matches!(board_rx.recv().await, Some(ServerEvent::NewPlayers { .. })));
        assert!(matches!(alice_rx.recv().await, Some(ServerEvent::NewPlayers { .. })));
        let (mut bob, _bob_rx) = client(3);
        join(&lobby, &mut bob, &away, "Bob").await;

        join(&lobby, &mut alice, &away, "Bob").await;
        assert_eq!(alice_rx.recv().await, Some(ServerEvent::JoinError));
        assert_eq!(alice.attached(), Some(&home));

        let home_room = lobby.registry().find(&home).await.expect("home room survives");
        assert!(home_room.is_player_present("Alice").await.unwrap());
        assert!(board_rx.try_recv().is_err());

        let away_room = lobby.registry().find(&away).await.unwrap();
        assert_eq!(away_room.get_info().await.unwrap().player_count, 1);
    }

    #[tokio::test]
    async fn test_second_seat_in_same_room_is_refused() {
        let lobby = lobby();
        let room = new_room(&lobby).await;

        let (mut alice, mut alice_rx) = client(2);
        join(&lobby, &mut alice, &room, "Alice").await;
        assert!(matches!(alice_rx.recv().await, Some(ServerEvent::NewPlayers { .. })));

        join(&lobby, &mut alice, &room, "Alicia").await;
        assert_eq!(alice_rx.recv().await, Some(ServerEvent::JoinError));
        assert_eq!(alice.attached(), Some(&room));

        let handle = lobby.registry().find(&room).await.unwrap();
        let info = handle.get_info().await.unwrap();
        assert_eq!(info.player_count, 1);
        assert!(!handle.is_player_present("Alicia").await.unwrap());
    }

    #[tokio::test]
    async fn test_accepted_join_leaves_previous_room() {
        let lobby = lobby();
        let home = new_room(&lobby).await;
        let away = new_room(&lobby).await;

        let (mut board, mut board_rx) = client(1);
        lobby
            .route(&mut board, ClientEvent::NewDisplayJoin { room: home.clone() })
            .await;
        let (mut alice, _alice_rx) = client(2);
        join(&lobby, &mut alice, &home, "Alice").await;
        assert!(matches!(board_rx.recv().await, Some(ServerEvent::NewPlayers { .. })));

        join(&lobby, &mut alice, &away, "Alice").await;
        assert_eq!(alice.attached(), Some(&away));
        assert!(matches!(
            board_rx.recv().await,
            Some(ServerEvent::NewPlayers { players }) if players.is_empty()
        ));
        assert_eq!(board_rx.recv().await, Some(ServerEvent::GameError));
    }

    #[tokio::test]
    async fn test_event_for_unknown_room_is_dropped() {
        let lobby = lobby();
        let (mut ctx, mut rx) = client(1);
        lobby
            .route(
                &mut ctx,
                ClientEvent::Buzz {
                    room: RoomCode::from("NOPENO"),
                    name: "Alice".into(),
                },
            )
            .await;
        assert!(rx.try_recv().is_err());
    }
}
