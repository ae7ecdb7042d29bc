//! Protocol handlers for one room.
//!
//! [`SessionController`] turns inbound room events and timer firings into
//! session mutations plus a list of [`Effects`]. It never touches a socket
//! or spawns a task; the room actor applies the effects afterwards. That
//! keeps every rule in this file testable without a runtime clock.
//!
//! Timers are never cancelled. Each carries the token of the clue it was
//! scheduled for, and its handler re-checks that the clue is still on
//! screen and unclaimed before acting.

use std::sync::Arc;
use std::time::Duration;

use buzzline_protocol::{Recipient, ServerEvent};
use buzzline_transport::ConnectionId;
use tracing::{debug, info, warn};

use crate::session::Player;
use crate::{ContentProvider, MatchConfig, MatchPhase, MatchSession};

/// A client event already routed to this room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    NewDisplayJoin,
    NewPlayerJoin { name: String },
    Kick { player: String },
    Start,
    ClueChosen { category_id: u32, clue_id: u32 },
    Buzz { name: String },
    Answer { answer: String },
    PlayerCorrect,
    PlayerIncorrect,
}

/// Delayed follow-ups the controller asks the actor to schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Reading time is over; open the buzzers.
    OpenBuzzers { token: u64 },
    /// Nobody buzzed in time.
    CloseBuzzWindow { token: u64 },
    /// The resolution pause is over; show the board or move on.
    ContinueRound { token: u64 },
}

/// What the actor must do after a handler returns, in this order:
/// subscribe the origin, send `outbound`, unsubscribe, schedule `timers`,
/// then tear the room down if asked.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Effects {
    pub outbound: Vec<(Recipient, ServerEvent)>,
    pub timers: Vec<(Duration, TimerEvent)>,
    pub subscribe: bool,
    pub unsubscribe: Option<ConnectionId>,
    pub teardown: bool,
}

impl Effects {
    fn broadcast(&mut self, event: ServerEvent) {
        self.outbound.push((Recipient::Room, event));
    }

    fn reply(&mut self, event: ServerEvent) {
        self.outbound.push((Recipient::Origin, event));
    }

    fn send_to(&mut self, conn: ConnectionId, event: ServerEvent) {
        self.outbound.push((Recipient::Connection(conn), event));
    }

    fn after(&mut self, delay: Duration, timer: TimerEvent) {
        self.timers.push((delay, timer));
    }

    /// Broadcast `gameError` and close the room.
    fn abort(&mut self) {
        self.broadcast(ServerEvent::GameError);
        self.teardown = true;
    }
}

/// Validates and applies events for one [`MatchSession`].
pub struct SessionController<P> {
    session: MatchSession,
    provider: Arc<P>,
    config: MatchConfig,
    /// Token of the last resolved clue whose continuation has not run yet.
    pending_continuation: Option<u64>,
}

impl<P: ContentProvider> SessionController<P> {
    pub fn new(session: MatchSession, provider: Arc<P>, config: MatchConfig) -> Self {
        Self {
            session,
            provider,
            config,
            pending_continuation: None,
        }
    }

    pub fn session(&self) -> &MatchSession {
        &self.session
    }

    /// Handles one client event from `origin`.
    pub async fn handle(&mut self, origin: ConnectionId, event: RoomEvent) -> Effects {
        let mut fx = Effects::default();
        match event {
            RoomEvent::NewDisplayJoin => self.on_display_join(origin, &mut fx),
            RoomEvent::NewPlayerJoin { name } => self.on_player_join(origin, name, &mut fx),
            RoomEvent::Kick { player } => self.on_kick(&player, &mut fx),
            RoomEvent::Start => self.on_start(&mut fx).await,
            RoomEvent::ClueChosen {
                category_id,
                clue_id,
            } => self.on_clue_chosen(category_id, clue_id, &mut fx),
            RoomEvent::Buzz { name } => self.on_buzz(&name, &mut fx),
            RoomEvent::Answer { answer } => self.on_answer(answer, &mut fx),
            RoomEvent::PlayerCorrect => self.on_confirmation(true, &mut fx),
            RoomEvent::PlayerIncorrect => self.on_confirmation(false, &mut fx),
        }
        fx
    }

    /// Handles a timer scheduled by an earlier [`Effects`].
    pub async fn on_timer(&mut self, timer: TimerEvent) -> Effects {
        let mut fx = Effects::default();
        match timer {
            TimerEvent::OpenBuzzers { token } => {
                if !self.clue_still_open(token) {
                    debug!(room = %self.session.room_code(), token, "open-buzzers timer is stale");
                    return fx;
                }
                if self.session.open_buzzers().is_ok() {
                    fx.broadcast(ServerEvent::AllowAnswers);
                    fx.after(self.config.timers.buzz_window, TimerEvent::CloseBuzzWindow { token });
                }
            }
            TimerEvent::CloseBuzzWindow { token } => {
                if !self.clue_still_open(token) {
                    debug!(room = %self.session.room_code(), token, "buzz-window timer is stale");
                    return fx;
                }
                self.resolve_unanswered(&mut fx);
            }
            TimerEvent::ContinueRound { token } => {
                let stale = self.pending_continuation != Some(token)
                    || self.session.phase().has_active_clue();
                if stale {
                    debug!(room = %self.session.room_code(), token, "continuation is stale");
                    return fx;
                }
                self.pending_continuation = None;
                self.continue_round(&mut fx).await;
            }
        }
        fx
    }

    /// Handles a transport-level disconnect.
    pub fn on_disconnect(&mut self, conn: ConnectionId) -> Effects {
        let mut fx = Effects::default();
        let room = self.session.room_code().clone();

        if self.session.board_connection() == Some(conn) {
            info!(room = %room, %conn, "board disconnected, closing room");
            fx.abort();
            return fx;
        }

        let Some(name) = self.session.player_by_connection(conn).map(|p| p.name.clone()) else {
            return fx;
        };
        self.release_answer(&name, &mut fx);
        self.session.remove_player(&name);
        info!(room = %room, player = %name, players = self.session.roster().len(), "player left");
        fx.broadcast(ServerEvent::NewPlayers {
            players: self.session.roster_view(),
        });
        fx.unsubscribe = Some(conn);

        if self.session.roster().is_empty() {
            info!(room = %room, "last player left, closing room");
            fx.abort();
        }
        fx
    }

    // -- join / lobby --------------------------------------------------------

    fn on_display_join(&mut self, origin: ConnectionId, fx: &mut Effects) {
        self.session.set_board_connection(origin);
        fx.subscribe = true;
        info!(room = %self.session.room_code(), conn = %origin, "board attached");
    }

    fn on_player_join(&mut self, origin: ConnectionId, name: String, fx: &mut Effects) {
        let room = self.session.room_code().clone();
        if name.trim().is_empty() {
            debug!(room = %room, conn = %origin, "join without a name");
            fx.reply(ServerEvent::JoinError);
            return;
        }
        if let Some(seated) = self.session.player_by_connection(origin) {
            debug!(
                room = %room,
                conn = %origin,
                seated = %seated.name,
                "connection already seated"
            );
            fx.reply(ServerEvent::JoinError);
            return;
        }
        if self.session.roster().len() >= self.config.max_players {
            debug!(room = %room, player = %name, "room full");
            fx.reply(ServerEvent::JoinError);
            return;
        }
        if let Err(err) = self.session.add_player(Player::new(name.clone(), origin)) {
            debug!(room = %room, player = %name, %err, "join rejected");
            fx.reply(ServerEvent::JoinError);
            return;
        }

        info!(room = %room, player = %name, players = self.session.roster().len(), "player joined");
        fx.subscribe = true;
        fx.broadcast(ServerEvent::NewPlayers {
            players: self.session.roster_view(),
        });
    }

    fn on_kick(&mut self, name: &str, fx: &mut Effects) {
        let room = self.session.room_code().clone();
        let Some(conn) = self.session.player(name).map(|p| p.connection) else {
            debug!(room = %room, player = %name, "kick for unknown player");
            return;
        };

        fx.send_to(
            conn,
            ServerEvent::Kick {
                room: room.clone(),
                player: name.to_owned(),
            },
        );
        self.release_answer(name, fx);
        self.session.remove_player(name);
        info!(room = %room, player = %name, "player kicked");
        fx.broadcast(ServerEvent::NewPlayers {
            players: self.session.roster_view(),
        });
        fx.unsubscribe = Some(conn);
    }

    async fn on_start(&mut self, fx: &mut Effects) {
        if self.session.phase() != MatchPhase::Lobby || self.session.roster().is_empty() {
            debug!(
                room = %self.session.room_code(),
                phase = %self.session.phase(),
                players = self.session.roster().len(),
                "start ignored"
            );
            return;
        }
        self.start_next_round(fx).await;
    }

    // -- clue protocol -------------------------------------------------------

    fn on_clue_chosen(&mut self, category_id: u32, clue_id: u32, fx: &mut Effects) {
        let room = self.session.room_code().clone();
        if self.session.phase() != MatchPhase::RoundActive {
            debug!(
                room = %room,
                phase = %self.session.phase(),
                category_id,
                clue_id,
                "clue choice dropped"
            );
            return;
        }
        let token = match self.session.choose_clue(category_id, clue_id) {
            Ok(token) => token,
            Err(err) => {
                debug!(room = %room, %err, "clue choice rejected");
                return;
            }
        };
        let Some(active) = self.session.active() else {
            return;
        };

        debug!(room = %room, category_id, clue_id, token, "clue chosen");
        fx.broadcast(ServerEvent::RegularQuestion {
            prompt: active.clue.prompt.clone(),
        });
        fx.after(self.config.timers.read_delay, TimerEvent::OpenBuzzers { token });
    }

    fn on_buzz(&mut self, name: &str, fx: &mut Effects) {
        let room = self.session.room_code().clone();
        if !self.session.phase().has_active_clue() || self.session.clue_is_answered() {
            debug!(room = %room, player = %name, "buzz dropped");
            return;
        }
        if !self.session.is_player_present(name) {
            debug!(room = %room, player = %name, "buzz from someone not seated");
            return;
        }
        if self.session.mark_answered().is_err()
            || self.session.set_answering_player(name).is_err()
        {
            return;
        }

        debug!(room = %room, player = %name, "buzz won");
        fx.broadcast(ServerEvent::AnswerQuestion {
            names: vec![name.to_owned()],
        });
    }

    fn on_answer(&mut self, answer: String, fx: &mut Effects) {
        let room = self.session.room_code().clone();
        if self.session.phase() != MatchPhase::AnswerPending {
            debug!(room = %room, phase = %self.session.phase(), "answer dropped");
            return;
        }
        let Some(active) = self.session.active() else {
            return;
        };
        let answerer = active.answering_player.clone().unwrap_or_default();
        let correct_answer = active.clue.correct_answer.clone();
        let is_match = self.session.check_answer(&answer);

        if self.session.record_submission(&answer).is_err() {
            return;
        }

        if is_match {
            fx.broadcast(ServerEvent::CorrectAnswer {
                answer,
                answerer: answerer.clone(),
            });
            if let Ok(resolved) = self.session.player_was_correct() {
                info!(
                    room = %room,
                    player = %answerer,
                    value = resolved.clue.value,
                    "answer correct"
                );
                self.schedule_continuation(resolved.token, fx);
            }
        } else {
            fx.broadcast(ServerEvent::ConfirmAnswer {
                correct_answer,
                player_answer: answer,
                answerer,
            });
        }
    }

    fn on_confirmation(&mut self, correct: bool, fx: &mut Effects) {
        let room = self.session.room_code().clone();
        if self.session.phase() != MatchPhase::AwaitingConfirmation {
            debug!(room = %room, correct, "confirmation dropped");
            return;
        }
        let result = if correct {
            self.session.player_was_correct()
        } else {
            self.session.player_was_incorrect()
        };
        if let Ok(resolved) = result {
            info!(
                room = %room,
                player = resolved.answering_player.as_deref().unwrap_or(""),
                correct,
                value = resolved.clue.value,
                "answer confirmed"
            );
            self.schedule_continuation(resolved.token, fx);
        }
    }

    // -- helpers -------------------------------------------------------------

    fn clue_still_open(&self, token: u64) -> bool {
        self.session.active_token() == Some(token) && !self.session.clue_is_answered()
    }

    /// Ends the active clue with nobody scoring.
    fn resolve_unanswered(&mut self, fx: &mut Effects) {
        if self.session.mark_answered().is_err() {
            return;
        }
        let Ok(resolved) = self.session.resolve_clue() else {
            return;
        };
        debug!(room = %self.session.room_code(), token = resolved.token, "clue timed out");
        fx.broadcast(ServerEvent::NoAnswer {
            correct_answer: resolved.clue.correct_answer,
        });
        self.schedule_continuation(resolved.token, fx);
    }

    /// If `name` holds the buzz and has not answered yet, nobody else can
    /// finish the clue, so it ends unanswered.
    fn release_answer(&mut self, name: &str, fx: &mut Effects) {
        if self.session.phase() == MatchPhase::AnswerPending
            && self.session.answering_player() == Some(name)
        {
            self.resolve_unanswered(fx);
        }
    }

    fn schedule_continuation(&mut self, token: u64, fx: &mut Effects) {
        self.pending_continuation = Some(token);
        fx.after(self.config.timers.resolution_delay, TimerEvent::ContinueRound { token });
    }

    async fn continue_round(&mut self, fx: &mut Effects) {
        if !self.session.is_round_over() {
            fx.broadcast(ServerEvent::UpdateGame(self.session.view_snapshot()));
            fx.broadcast(ServerEvent::ChooseClue(self.session.choose_clue_snapshot()));
            return;
        }
        if self.session.is_final_round() {
            self.session.complete_match();
            info!(room = %self.session.room_code(), "match complete");
            fx.broadcast(ServerEvent::UpdateGame(self.session.view_snapshot()));
            fx.broadcast(ServerEvent::MatchComplete {
                players: self.session.roster_view(),
            });
            return;
        }
        self.start_next_round(fx).await;
    }

    async fn start_next_round(&mut self, fx: &mut Effects) {
        let room = self.session.room_code().clone();
        match self
            .session
            .advance_round(self.provider.as_ref(), self.config.min_year)
            .await
        {
            Ok(round) => {
                info!(room = %room, round, "round started");
                fx.broadcast(ServerEvent::UpdateGame(self.session.view_snapshot()));
                fx.broadcast(ServerEvent::ChooseClue(self.session.choose_clue_snapshot()));
            }
            Err(err) => {
                warn!(room = %room, %err, "could not load round content");
                fx.abort();
            }
        }
    }
}
