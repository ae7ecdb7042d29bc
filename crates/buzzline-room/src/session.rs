//! One room's authoritative match state.
//!
//! [`MatchSession`] owns the roster, the board, and the active clue. It is
//! plain data with synchronous operations, except for
//! [`MatchSession::advance_round`], which awaits the content provider. The
//! room actor is the only owner, so nothing here locks.

use buzzline_protocol::{ChooseClueSnapshot, PlayerView, RoomCode, ViewSnapshot};
use buzzline_transport::ConnectionId;

use crate::{ClueBoard, ClueEntry, ContentProvider, MatchPhase, RoomError};

/// A seated player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Unique within the session, compared case-sensitively.
    pub name: String,
    /// May go negative.
    pub earnings: i64,
    pub connection: ConnectionId,
}

impl Player {
    pub fn new(name: impl Into<String>, connection: ConnectionId) -> Self {
        Self {
            name: name.into(),
            earnings: 0,
            connection,
        }
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            name: self.name.clone(),
            earnings: self.earnings,
        }
    }
}

/// The clue currently on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveClue {
    pub clue: ClueEntry,
    pub category_id: u32,
    pub clue_id: u32,
    /// Identity of this choice; timers compare it before acting.
    pub token: u64,
    /// Set by the first buzz or by the buzz window closing. Once set,
    /// nothing else may claim the clue.
    pub answered: bool,
    pub answering_player: Option<String>,
    pub buzzers_open: bool,
    pub submitted_answer: Option<String>,
}

/// Authoritative state of one match.
#[derive(Debug)]
pub struct MatchSession {
    room_code: RoomCode,
    board_connection: Option<ConnectionId>,
    roster: Vec<Player>,
    player_in_control: Option<String>,
    round: u32,
    final_round: u32,
    board: ClueBoard,
    active: Option<ActiveClue>,
    complete: bool,
    next_token: u64,
}

impl MatchSession {
    pub fn new(room_code: RoomCode, final_round: u32) -> Self {
        Self {
            room_code,
            board_connection: None,
            roster: Vec::new(),
            player_in_control: None,
            round: 0,
            final_round,
            board: ClueBoard::Empty,
            active: None,
            complete: false,
            next_token: 1,
        }
    }

    pub fn room_code(&self) -> &RoomCode {
        &self.room_code
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn final_round(&self) -> u32 {
        self.final_round
    }

    pub fn board(&self) -> &ClueBoard {
        &self.board
    }

    pub fn roster(&self) -> &[Player] {
        &self.roster
    }

    pub fn active(&self) -> Option<&ActiveClue> {
        self.active.as_ref()
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn player_in_control(&self) -> Option<&Player> {
        let name = self.player_in_control.as_deref()?;
        self.player(name)
    }

    pub fn player(&self, name: &str) -> Option<&Player> {
        self.roster.iter().find(|p| p.name == name)
    }

    // -- board connection ---------------------------------------------------

    pub fn board_connection(&self) -> Option<ConnectionId> {
        self.board_connection
    }

    pub fn set_board_connection(&mut self, conn: ConnectionId) {
        self.board_connection = Some(conn);
    }

    // -- roster -------------------------------------------------------------

    /// Seats a player at the end of the roster. The first player seated
    /// takes control.
    pub fn add_player(&mut self, player: Player) -> Result<(), RoomError> {
        if self.is_player_present(&player.name) {
            return Err(RoomError::NameTaken(player.name));
        }
        if self.player_in_control.is_none() {
            self.player_in_control = Some(player.name.clone());
        }
        self.roster.push(player);
        Ok(())
    }

    /// Removes a player. If they held control it passes to the
    /// earliest-joined player still seated.
    pub fn remove_player(&mut self, name: &str) -> Option<Player> {
        let index = self.roster.iter().position(|p| p.name == name)?;
        let removed = self.roster.remove(index);
        if self.player_in_control.as_deref() == Some(name) {
            self.player_in_control = self.roster.first().map(|p| p.name.clone());
        }
        Some(removed)
    }

    pub fn is_player_present(&self, name: &str) -> bool {
        self.player(name).is_some()
    }

    pub fn player_by_connection(&self, conn: ConnectionId) -> Option<&Player> {
        self.roster.iter().find(|p| p.connection == conn)
    }

    // -- rounds -------------------------------------------------------------

    /// Fetches and installs the next round's content.
    ///
    /// Nothing changes unless the fetch succeeds and the content has the
    /// right shape. From round 2 on, control goes to the player with the
    /// strictly lowest earnings, earliest-joined on ties.
    pub async fn advance_round<P: ContentProvider>(
        &mut self,
        provider: &P,
        min_year: i32,
    ) -> Result<u32, RoomError> {
        let next = self.round + 1;
        let board = if next >= self.final_round {
            ClueBoard::final_round(provider.fetch_final_clue(min_year).await?)
        } else {
            ClueBoard::round(provider.fetch_board(next, min_year).await?)?
        };

        self.round = next;
        self.board = board;
        self.active = None;

        if next > 1 {
            // min_by_key keeps the first of equal elements.
            if let Some(lowest) = self.roster.iter().min_by_key(|p| p.earnings) {
                self.player_in_control = Some(lowest.name.clone());
            }
        }
        Ok(next)
    }

    pub fn is_final_round(&self) -> bool {
        self.round >= self.final_round
    }

    /// True once every clue of the current round has been played.
    pub fn is_round_over(&self) -> bool {
        self.round > 0 && self.board.is_cleared()
    }

    pub fn complete_match(&mut self) {
        self.complete = true;
        self.active = None;
    }

    // -- the active clue ----------------------------------------------------

    /// Puts a clue on screen and returns its token.
    pub fn choose_clue(&mut self, category_id: u32, clue_id: u32) -> Result<u64, RoomError> {
        let clue = self.board.lookup(category_id, clue_id)?.clone();
        let token = self.next_token;
        self.next_token += 1;
        self.active = Some(ActiveClue {
            clue,
            category_id,
            clue_id,
            token,
            answered: false,
            answering_player: None,
            buzzers_open: false,
            submitted_answer: None,
        });
        Ok(token)
    }

    /// Token of the clue on screen, if any.
    pub fn active_token(&self) -> Option<u64> {
        self.active.as_ref().map(|a| a.token)
    }

    pub fn open_buzzers(&mut self) -> Result<(), RoomError> {
        let active = self.active.as_mut().ok_or(RoomError::NoActiveClue)?;
        active.buzzers_open = true;
        Ok(())
    }

    /// Claims the active clue. Calling it again changes nothing.
    pub fn mark_answered(&mut self) -> Result<(), RoomError> {
        let active = self.active.as_mut().ok_or(RoomError::NoActiveClue)?;
        active.answered = true;
        Ok(())
    }

    pub fn clue_is_answered(&self) -> bool {
        self.active.as_ref().is_some_and(|a| a.answered)
    }

    pub fn set_answering_player(&mut self, name: &str) -> Result<(), RoomError> {
        let active = self.active.as_mut().ok_or(RoomError::NoActiveClue)?;
        active.answering_player = Some(name.to_owned());
        Ok(())
    }

    pub fn answering_player(&self) -> Option<&str> {
        self.active.as_ref()?.answering_player.as_deref()
    }

    /// Trimmed, case-insensitive exact match against the active clue.
    pub fn check_answer(&self, submitted: &str) -> bool {
        self.active
            .as_ref()
            .is_some_and(|a| normalize(submitted) == normalize(&a.clue.correct_answer))
    }

    pub fn record_submission(&mut self, answer: &str) -> Result<(), RoomError> {
        let active = self.active.as_mut().ok_or(RoomError::NoActiveClue)?;
        active.submitted_answer = Some(answer.to_owned());
        Ok(())
    }

    /// Takes the clue off the board and clears it from the screen.
    pub fn resolve_clue(&mut self) -> Result<ActiveClue, RoomError> {
        let active = self.active.take().ok_or(RoomError::NoActiveClue)?;
        self.board.tombstone(active.category_id, active.clue_id);
        Ok(active)
    }

    // -- scoring ------------------------------------------------------------

    /// Adds `delta` to a player's earnings. Unknown names are ignored; the
    /// player may have left mid-clue.
    pub fn adjust_earnings(&mut self, name: &str, delta: i64) {
        if let Some(player) = self.roster.iter_mut().find(|p| p.name == name) {
            player.earnings += delta;
        }
    }

    /// Credits the answering player with the clue value and resolves it.
    pub fn player_was_correct(&mut self) -> Result<ActiveClue, RoomError> {
        self.settle(1)
    }

    /// Debits the answering player by the clue value and resolves it.
    pub fn player_was_incorrect(&mut self) -> Result<ActiveClue, RoomError> {
        self.settle(-1)
    }

    fn settle(&mut self, sign: i64) -> Result<ActiveClue, RoomError> {
        let active = self.active.as_ref().ok_or(RoomError::NoActiveClue)?;
        if let Some(name) = active.answering_player.clone() {
            self.adjust_earnings(&name, sign * active.clue.value);
        }
        self.resolve_clue()
    }

    // -- projections --------------------------------------------------------

    pub fn roster_view(&self) -> Vec<PlayerView> {
        self.roster.iter().map(Player::view).collect()
    }

    pub fn view_snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            board: self.board.view(),
            players: self.roster_view(),
            player_in_control: self.player_in_control().map(Player::view),
            round: self.round,
        }
    }

    pub fn choose_clue_snapshot(&self) -> ChooseClueSnapshot {
        ChooseClueSnapshot {
            player_in_control: self.player_in_control().map(Player::view),
            board: self.board.view(),
        }
    }

    pub fn phase(&self) -> MatchPhase {
        if self.complete {
            return MatchPhase::MatchComplete;
        }
        if self.round == 0 {
            return MatchPhase::Lobby;
        }
        match &self.active {
            Some(a) if a.submitted_answer.is_some() => MatchPhase::AwaitingConfirmation,
            Some(a) if a.answering_player.is_some() => MatchPhase::AnswerPending,
            Some(a) if a.buzzers_open && !a.answered => MatchPhase::BuzzWindowOpen,
            Some(_) => MatchPhase::ClueChosen,
            None if self.board.is_cleared() => MatchPhase::RoundComplete,
            None => MatchPhase::RoundActive,
        }
    }
}

fn normalize(answer: &str) -> String {
    answer.trim().to_lowercase()
}
