//! Codec trait and the JSON implementation.
//!
//! The room and the lobby only ever see typed events; whatever sits behind
//! [`Codec`] decides how those look on the wire.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Encodes values to bytes and decodes bytes back.
pub trait Codec: Send + Sync + 'static {
    /// Serialize `value` into a fresh buffer.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserialize an owned `T` from `data`.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// Plain JSON, one event per frame.
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{ClientEvent, RoomCode, ServerEvent};

    #[test]
    fn test_decode_client_event_from_bytes() {
        let codec = JsonCodec;
        let raw = br#"{"event":"buzz","data":{"room":"QWERTY","name":"Alice"}}"#;

        let event: ClientEvent = codec.decode(raw).unwrap();
        assert_eq!(
            event,
            ClientEvent::Buzz {
                room: RoomCode::from("QWERTY"),
                name: "Alice".into(),
            }
        );
    }

    #[test]
    fn test_encode_server_event_to_bytes() {
        let codec = JsonCodec;
        let bytes = codec.encode(&ServerEvent::AllowAnswers).unwrap();
        assert_eq!(bytes, br#"{"event":"allowAnswers"}"#);
    }

    #[test]
    fn test_decode_garbage_is_decode_error() {
        let codec = JsonCodec;
        let result: Result<ClientEvent, _> = codec.decode(b"not json {{{");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_decode_unknown_event_is_decode_error() {
        let codec = JsonCodec;
        let raw = br#"{"event":"dailyDouble","data":{"room":"QWERTY"}}"#;
        let result: Result<ClientEvent, _> = codec.decode(raw);
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_decode_missing_field_is_decode_error() {
        let codec = JsonCodec;
        let raw = br#"{"event":"newPlayerJoin","data":{"room":"QWERTY"}}"#;
        let result: Result<ClientEvent, _> = codec.decode(raw);
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
