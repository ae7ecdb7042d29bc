//! Match configuration and the match phase machine.

use std::fmt;

use buzzline_timer::TimerConfig;

/// Per-room settings, shared by every room a registry creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchConfig {
    /// Roster capacity. The seventh player is turned away.
    pub max_players: usize,
    /// The last round. Rounds before it use a full board, this one uses a
    /// single final clue.
    pub final_round: u32,
    /// Only content from after this year is used.
    pub min_year: i32,
    /// Delays of the clue protocol.
    pub timers: TimerConfig,
    /// Capacity of each room actor's command channel.
    pub channel_size: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            max_players: 6,
            final_round: 3,
            min_year: 0,
            timers: TimerConfig::default(),
            channel_size: 64,
        }
    }
}

impl MatchConfig {
    /// Clamps timer delays and keeps the numeric settings usable.
    pub fn validated(mut self) -> Self {
        self.timers = self.timers.validated();
        if self.channel_size == 0 {
            tracing::warn!("channel_size of 0 is not allowed, using 1");
            self.channel_size = 1;
        }
        if self.final_round == 0 {
            tracing::warn!("final_round of 0 is not allowed, using 1");
            self.final_round = 1;
        }
        self
    }
}

/// Where a match is in its lifecycle.
///
/// ```text
/// Lobby → RoundActive → ClueChosen → BuzzWindowOpen → AnswerPending
///       → AwaitingConfirmation → RoundActive | RoundComplete
/// RoundComplete → RoundActive (next round) | MatchComplete
/// ```
///
/// The phase is derived from session state rather than stored, so it can
/// never disagree with the board or the active clue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchPhase {
    Lobby,
    RoundActive,
    ClueChosen,
    BuzzWindowOpen,
    AnswerPending,
    AwaitingConfirmation,
    RoundComplete,
    MatchComplete,
}

impl MatchPhase {
    /// True while a clue is on screen and unresolved.
    pub fn has_active_clue(&self) -> bool {
        matches!(
            self,
            Self::ClueChosen
                | Self::BuzzWindowOpen
                | Self::AnswerPending
                | Self::AwaitingConfirmation
        )
    }
}

impl fmt::Display for MatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lobby => write!(f, "Lobby"),
            Self::RoundActive => write!(f, "RoundActive"),
            Self::ClueChosen => write!(f, "ClueChosen"),
            Self::BuzzWindowOpen => write!(f, "BuzzWindowOpen"),
            Self::AnswerPending => write!(f, "AnswerPending"),
            Self::AwaitingConfirmation => write!(f, "AwaitingConfirmation"),
            Self::RoundComplete => write!(f, "RoundComplete"),
            Self::MatchComplete => write!(f, "MatchComplete"),
        }
    }
}
