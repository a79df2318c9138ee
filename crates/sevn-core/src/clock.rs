// crates/sevn-core/src/clock.rs
//
// Tick sources for the farm engine.
//
// ManualClock is a shared, settable tick counter for simulations and tests.
// SystemClock reads wall-clock UNIX seconds, matching farms that accrue per
// second rather than per block.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::traits::TimeSource;
use crate::Tick;

/// Settable tick counter. Clones share the same underlying counter, so a
/// test can keep one handle while the engine owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    tick: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: Tick) -> Self {
        Self {
            tick: Arc::new(AtomicU64::new(start)),
        }
    }

    /// Move the clock to `tick`. Earlier ticks are ignored so the clock stays
    /// monotonic.
    pub fn set(&self, tick: Tick) {
        self.tick.fetch_max(tick, Ordering::SeqCst);
    }

    /// Advance the clock by `ticks` and return the new tick. Saturates at
    /// `Tick::MAX`.
    pub fn advance(&self, ticks: Tick) -> Tick {
        let prev = match self
            .tick
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |t| {
                Some(t.saturating_add(ticks))
            }) {
            Ok(prev) | Err(prev) => prev,
        };
        prev.saturating_add(ticks)
    }
}

impl TimeSource for ManualClock {
    fn current_tick(&self) -> Tick {
        self.tick.load(Ordering::SeqCst)
    }
}

/// Wall-clock UNIX seconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn current_tick(&self) -> Tick {
        // Clamp pre-epoch clocks to zero rather than wrapping.
        chrono::Utc::now().timestamp().max(0) as Tick
    }
}
