//! One-shot timers for Buzzline room actors.
//!
//! A match has three fixed delays: the reading pause before buzzers open,
//! the buzz window itself, and the pause after a clue resolves before the
//! board changes. None of them are ever cancelled. A timer posts its
//! message back into the room's command channel and the room re-checks
//! whether the message still applies.
//!
//! # Integration
//!
//! ```ignore
//! let timers = TimerScheduler::new(room_tx.downgrade());
//! timers.schedule(config.read_delay, RoomCommand::Timer(..));
//! // later, inside the actor loop:
//! while let Some(cmd) = room_rx.recv().await { /* guard, then act */ }
//! ```
//!
//! The scheduler holds only a weak sender, so a pending timer never keeps
//! a torn-down room alive.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// The fixed delays of the clue protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerConfig {
    /// Pause between revealing a clue and opening the buzzers.
    pub read_delay: Duration,
    /// How long buzzers stay open before the clue times out.
    pub buzz_window: Duration,
    /// Pause after a clue resolves before the board is shown again.
    pub resolution_delay: Duration,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            read_delay: Duration::from_secs(2),
            buzz_window: Duration::from_secs(5),
            resolution_delay: Duration::from_secs(2),
        }
    }
}

impl TimerConfig {
    /// Upper bound for any single delay.
    pub const MAX_DELAY: Duration = Duration::from_secs(60);

    /// Clamp every delay to [`Self::MAX_DELAY`].
    ///
    /// Zero is allowed; tests use it to run the protocol without waiting.
    pub fn validated(mut self) -> Self {
        for (name, delay) in [
            ("read_delay", &mut self.read_delay),
            ("buzz_window", &mut self.buzz_window),
            ("resolution_delay", &mut self.resolution_delay),
        ] {
            if *delay > Self::MAX_DELAY {
                warn!(
                    timer = name,
                    requested_ms = delay.as_millis() as u64,
                    max_ms = Self::MAX_DELAY.as_millis() as u64,
                    "timer delay exceeds maximum, clamping"
                );
                *delay = Self::MAX_DELAY;
            }
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Counters shared by every timer spawned from one scheduler.
#[derive(Debug, Default)]
pub struct TimerMetrics {
    scheduled: AtomicU64,
    fired: AtomicU64,
    dropped: AtomicU64,
}

/// Point-in-time copy of [`TimerMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimerStats {
    /// Timers handed to [`TimerScheduler::schedule`].
    pub scheduled: u64,
    /// Timers whose message reached the target channel.
    pub fired: u64,
    /// Timers whose target was gone when they elapsed.
    pub dropped: u64,
}

impl TimerMetrics {
    /// Reads all counters.
    pub fn snapshot(&self) -> TimerStats {
        TimerStats {
            scheduled: self.scheduled.load(Ordering::Relaxed),
            fired: self.fired.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Schedules delayed messages into one actor's command channel.
pub struct TimerScheduler<T> {
    target: mpsc::WeakSender<T>,
    metrics: Arc<TimerMetrics>,
}

impl<T> Clone for TimerScheduler<T> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            metrics: Arc::clone(&self.metrics),
        }
    }
}

impl<T: Send + 'static> TimerScheduler<T> {
    /// Creates a scheduler that delivers into `target`.
    pub fn new(target: mpsc::WeakSender<T>) -> Self {
        Self {
            target,
            metrics: Arc::new(TimerMetrics::default()),
        }
    }

    /// Delivers `msg` after `delay`.
    ///
    /// Fire-and-forget: the returned handle may be dropped. If the target
    /// channel is closed by the time the delay elapses the message is
    /// discarded and counted as dropped.
    pub fn schedule(&self, delay: Duration, msg: T) -> JoinHandle<()> {
        self.metrics.scheduled.fetch_add(1, Ordering::Relaxed);
        trace!(delay_ms = delay.as_millis() as u64, "timer scheduled");

        let target = self.target.clone();
        let metrics = Arc::clone(&self.metrics);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let delivered = match target.upgrade() {
                Some(tx) => tx.send(msg).await.is_ok(),
                None => false,
            };
            if delivered {
                metrics.fired.fetch_add(1, Ordering::Relaxed);
            } else {
                metrics.dropped.fetch_add(1, Ordering::Relaxed);
                debug!("timer target gone, message dropped");
            }
        })
    }

    /// Counters for every timer this scheduler (or a clone) has spawned.
    pub fn stats(&self) -> TimerStats {
        self.metrics.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_delays() {
        let cfg = TimerConfig::default();
        assert_eq!(cfg.read_delay, Duration::from_secs(2));
        assert_eq!(cfg.buzz_window, Duration::from_secs(5));
        assert_eq!(cfg.resolution_delay, Duration::from_secs(2));
    }

    #[test]
    fn test_validated_clamps_long_delays() {
        let cfg = TimerConfig {
            buzz_window: Duration::from_secs(600),
            ..TimerConfig::default()
        }
        .validated();
        assert_eq!(cfg.buzz_window, TimerConfig::MAX_DELAY);
        assert_eq!(cfg.read_delay, Duration::from_secs(2));
    }

    #[test]
    fn test_validated_keeps_zero() {
        let cfg = TimerConfig {
            read_delay: Duration::ZERO,
            buzz_window: Duration::ZERO,
            resolution_delay: Duration::ZERO,
        }
        .validated();
        assert_eq!(cfg.read_delay, Duration::ZERO);
    }
}
