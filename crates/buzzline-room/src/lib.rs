//! Match sessions and room management for Buzzline.
//!
//! - [`RoomRegistry`] opens rooms under six-letter codes and finds them.
//! - Each room runs as an actor ([`RoomHandle`]) that owns one
//!   [`MatchSession`] and applies events through a [`SessionController`].
//! - Round content comes from a [`ContentProvider`]; [`ClueBank`] is the
//!   JSON-backed one.
//!
//! ```text
//! Lobby ──► RoomRegistry ──► RoomHandle ──► room actor
//!                                             ├─ SessionController
//!                                             │    └─ MatchSession ─ ClueBoard
//!                                             └─ TimerScheduler ──┘ (posts back)
//! ```

#![allow(async_fn_in_trait)]

mod board;
mod code;
mod config;
mod content;
mod controller;
mod error;
mod registry;
mod room;
mod session;

pub use board::{
    CategoryColumn, ClueBoard, ClueEntry, FinalClue, BOARD_COLUMNS, COLUMN_SLOTS,
    FINAL_CATEGORY_ID,
};
pub use code::random_room_code;
pub use config::{MatchConfig, MatchPhase};
pub use content::{
    base_value, BankCategory, BankClue, ClueBank, ContentError, ContentProvider, RoundKind,
};
pub use controller::{Effects, RoomEvent, SessionController, TimerEvent};
pub use error::RoomError;
pub use registry::RoomRegistry;
pub use room::{ConnectionSender, RoomHandle, RoomInfo};
pub use session::{ActiveClue, MatchSession, Player};
