//! # Buzzline
//!
//! Real-time trivia match server. A board screen and up to six players
//! join a room by its six-letter code, and the server runs the rounds:
//! clue chosen, reading pause, buzz window, one answer, scoring.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use buzzline::prelude::*;
//!
//! # async fn start() -> Result<(), BuzzlineError> {
//! buzzline::init_tracing("buzzline=debug");
//! let bank = ClueBank::load("clues.json").await?;
//! let server = BuzzlineServer::builder()
//!     .bind("0.0.0.0:5000")
//!     .build(bank)
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod lobby;
mod server;

pub use buzzline_protocol as protocol;
pub use buzzline_room as room;
pub use buzzline_timer as timer;
pub use buzzline_transport as transport;

pub use error::BuzzlineError;
pub use lobby::{ClientContext, Lobby, NAME_TAKEN, NO_SUCH_ROOM};
pub use server::{BuzzlineServer, BuzzlineServerBuilder};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs a `fmt` subscriber filtered by `RUST_LOG`, or by
/// `default_filter` when `RUST_LOG` is unset. A second call is a no-op.
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

pub mod prelude {
    pub use crate::{BuzzlineError, BuzzlineServer, BuzzlineServerBuilder};
    pub use buzzline_protocol::{ClientEvent, RoomCode, ServerEvent};
    pub use buzzline_room::{ClueBank, ContentProvider, MatchConfig, RoomRegistry};
    pub use buzzline_timer::TimerConfig;
}
