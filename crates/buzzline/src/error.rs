//! Top-level error type.
//!
//! Each layer keeps its own error enum; [`BuzzlineError`] wraps them so `?`
//! works across layer boundaries.

use buzzline_protocol::ProtocolError;
use buzzline_room::{ContentError, RoomError};
use buzzline_transport::TransportError;

#[derive(Debug, thiserror::Error)]
pub enum BuzzlineError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Room(#[from] RoomError),

    #[error(transparent)]
    Content(#[from] ContentError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use buzzline_protocol::RoomCode;

    #[test]
    fn test_from_transport_error() {
        let err: BuzzlineError = TransportError::ConnectionClosed("gone".into()).into();
        assert!(matches!(err, BuzzlineError::Transport(_)));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err: BuzzlineError = ProtocolError::InvalidMessage("bad".into()).into();
        assert!(matches!(err, BuzzlineError::Protocol(_)));
    }

    #[test]
    fn test_from_room_error() {
        let err: BuzzlineError = RoomError::RoomNotFound(RoomCode::from("QWERTY")).into();
        assert!(matches!(err, BuzzlineError::Room(_)));
        assert_eq!(err.to_string(), "no room with that id found: QWERTY");
    }

    #[test]
    fn test_from_content_error() {
        let err: BuzzlineError = ContentError::UnsupportedRound(9).into();
        assert!(matches!(err, BuzzlineError::Content(_)));
    }
}
