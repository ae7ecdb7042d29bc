//! Event and view types that travel on the wire.
//!
//! Both directions use adjacent tagging, so every frame looks like
//! `{"event": "clueChosen", "data": {"room": "QWERTY", "categoryId": 2, "clueId": 4}}`.
//! Events without a payload serialize as just `{"event": "allowAnswers"}`.

use std::fmt;

use buzzline_transport::ConnectionId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomCode
// ---------------------------------------------------------------------------

/// Six-letter code that names a live room, e.g. `"QWERTY"`.
///
/// Serialized as a bare string. Codes are compared exactly; a client that
/// sends `"qwerty"` is looking for a different room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Number of characters in a generated code.
    pub const LEN: usize = 6;

    /// Wraps a code without checking it.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Borrow the code as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if this is exactly [`Self::LEN`] characters from `A..=Z`.
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == Self::LEN && self.0.bytes().all(|b| b.is_ascii_uppercase())
    }

    /// True for the empty string, which the lobby treats as a missing
    /// join parameter.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<&str> for RoomCode {
    fn from(code: &str) -> Self {
        Self(code.to_owned())
    }
}

impl From<String> for RoomCode {
    fn from(code: String) -> Self {
        Self(code)
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Recipient
// ---------------------------------------------------------------------------

/// Who an outbound event is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Every connection subscribed to the room channel.
    Room,
    /// Only the connection whose event is being handled.
    Origin,
    /// One specific connection, subscribed or not.
    Connection(ConnectionId),
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// A player as everyone else sees them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub name: String,
    pub earnings: i64,
}

/// One still-playable clue on the board. The prompt and answer stay
/// server-side until the clue is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotView {
    pub id: u32,
    pub value: i64,
}

/// One category column. Played slots are `null` and keep their position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnView {
    pub id: u32,
    pub title: String,
    pub clues: Vec<Option<SlotView>>,
}

/// The board as shown to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BoardView {
    /// No round has started yet.
    Empty,
    /// A regular round: six columns of five slots.
    Round { columns: Vec<ColumnView> },
    /// The final round shows only its category until the clue is chosen.
    Final {
        category: String,
        /// `false` once the final clue has been played.
        available: bool,
    },
}

/// Payload of `updateGame`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSnapshot {
    pub board: BoardView,
    pub players: Vec<PlayerView>,
    pub player_in_control: Option<PlayerView>,
    pub round: u32,
}

/// Payload of `chooseClue`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChooseClueSnapshot {
    pub player_in_control: Option<PlayerView>,
    pub board: BoardView,
}

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// Everything a board or player may send.
///
/// Disconnect is not an event; the transport reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    /// Ask the server to open a new room.
    NewGame,
    /// Pre-flight check before a player commits to a name.
    Joining { room: RoomCode, name: String },
    /// Attach this connection as the room's board.
    NewDisplayJoin { room: RoomCode },
    /// Attach this connection as a named player.
    NewPlayerJoin { room: RoomCode, name: String },
    /// Remove a player by name.
    Kick { room: RoomCode, player: String },
    /// Start round one.
    Start { room: RoomCode },
    /// The player in control picked a clue.
    ClueChosen {
        room: RoomCode,
        category_id: u32,
        clue_id: u32,
    },
    /// A player hit the buzzer.
    Buzz { room: RoomCode, name: String },
    /// The buzzing player's answer.
    Answer { room: RoomCode, answer: String },
    /// Host override: the pending answer is right.
    PlayerCorrect { room: RoomCode },
    /// Host override: the pending answer is wrong.
    PlayerIncorrect { room: RoomCode },
}

impl ClientEvent {
    /// Wire name, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NewGame => "newGame",
            Self::Joining { .. } => "joining",
            Self::NewDisplayJoin { .. } => "newDisplayJoin",
            Self::NewPlayerJoin { .. } => "newPlayerJoin",
            Self::Kick { .. } => "kick",
            Self::Start { .. } => "start",
            Self::ClueChosen { .. } => "clueChosen",
            Self::Buzz { .. } => "buzz",
            Self::Answer { .. } => "answer",
            Self::PlayerCorrect { .. } => "playerCorrect",
            Self::PlayerIncorrect { .. } => "playerIncorrect",
        }
    }
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// Everything the server may send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    NewGameCreated { room_code: RoomCode },
    JoinConfirmed,
    ErrorMessage { text: String },
    JoinError,
    Kick { room: RoomCode, player: String },
    NewPlayers { players: Vec<PlayerView> },
    UpdateGame(ViewSnapshot),
    ChooseClue(ChooseClueSnapshot),
    RegularQuestion { prompt: String },
    AllowAnswers,
    AnswerQuestion { names: Vec<String> },
    NoAnswer { correct_answer: String },
    CorrectAnswer { answer: String, answerer: String },
    ConfirmAnswer {
        correct_answer: String,
        player_answer: String,
        answerer: String,
    },
    MatchComplete { players: Vec<PlayerView> },
    GameError,
}
