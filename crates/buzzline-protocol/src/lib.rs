//! Wire protocol for Buzzline.
//!
//! Every frame on the wire is one JSON object of the form
//! `{"event": "<camelCaseName>", "data": {...}}`:
//!
//! - **Inbound** ([`ClientEvent`]): what boards and players send.
//! - **Outbound** ([`ServerEvent`]): what the room sends back, carrying
//!   read-only views ([`ViewSnapshot`], [`BoardView`], [`PlayerView`]).
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): bytes in, events out.
//!
//! ```text
//! Transport (bytes) → Protocol (ClientEvent) → Room (MatchSession)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    BoardView, ChooseClueSnapshot, ClientEvent, ColumnView, PlayerView,
    Recipient, RoomCode, ServerEvent, SlotView, ViewSnapshot,
};
