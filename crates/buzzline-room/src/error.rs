use buzzline_protocol::RoomCode;

use crate::ContentError;

/// Errors raised by rooms, sessions, and the registry.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    #[error("no room with that id found: {0}")]
    RoomNotFound(RoomCode),

    #[error("name already taken: {0}")]
    NameTaken(String),

    #[error("room {0} is full")]
    RoomFull(RoomCode),

    #[error("no clue {clue_id} in category {category_id}")]
    UnknownClue { category_id: u32, clue_id: u32 },

    #[error("no category {0} on the board")]
    UnknownCategory(u32),

    #[error("content unavailable: {0}")]
    ContentUnavailable(#[from] ContentError),

    #[error("room and name must both be non-empty")]
    InvalidJoinParameters,

    #[error("no clue is active")]
    NoActiveClue,

    #[error("room {0} is unavailable")]
    Unavailable(RoomCode),
}
