// crates/sevn-farm/src/emission.rs
//
// Reward emission schedule.
//
// Reward is minted at a constant rate per tick starting at `start_tick`.
// An optional bonus era multiplies the rate for every tick before
// `BonusEra::end_tick`. Intervals that straddle the bonus boundary are split
// there, each side minted at its own rate, and the two parts summed. The
// computation is O(1) in the length of the interval.

use serde::{Deserialize, Serialize};

use sevn_core::{Amount, FarmError, Tick};

/// A one-time boosted emission era at the beginning of the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusEra {
    /// First tick that is no longer boosted.
    pub end_tick: Tick,
    /// Rate multiplier applied to ticks before `end_tick`. Must be at least 1.
    pub multiplier: u64,
}

/// Global emission parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmissionSchedule {
    /// Reward units minted per tick across all pools.
    rate: Amount,
    /// No reward accrues before this tick.
    start_tick: Tick,
    bonus: Option<BonusEra>,
}

impl EmissionSchedule {
    /// Create a schedule.
    ///
    /// # Errors
    /// Returns `FarmError::InvalidConfig` if the bonus multiplier is zero.
    pub fn new(rate: Amount, start_tick: Tick, bonus: Option<BonusEra>) -> Result<Self, FarmError> {
        if let Some(era) = bonus {
            if era.multiplier == 0 {
                return Err(FarmError::InvalidConfig(
                    "bonus multiplier must be at least 1".to_string(),
                ));
            }
        }
        Ok(Self {
            rate,
            start_tick,
            bonus,
        })
    }

    pub fn rate(&self) -> Amount {
        self.rate
    }

    pub fn start_tick(&self) -> Tick {
        self.start_tick
    }

    pub fn bonus(&self) -> Option<BonusEra> {
        self.bonus
    }

    pub(crate) fn set_rate(&mut self, rate: Amount) {
        self.rate = rate;
    }

    /// Bonus-weighted number of ticks in `[from, to)` after clamping `from`
    /// to the start tick. Boosted ticks count `multiplier` times.
    pub fn multiplier(&self, from: Tick, to: Tick) -> Result<u128, FarmError> {
        let from = from.max(self.start_tick);
        if to <= from {
            return Ok(0);
        }

        let Some(era) = self.bonus else {
            return Ok(u128::from(to - from));
        };

        let boosted = |ticks: Tick| {
            u128::from(ticks)
                .checked_mul(u128::from(era.multiplier))
                .ok_or_else(|| {
                    FarmError::ArithmeticOverflow(format!(
                        "{} ticks at bonus multiplier {}",
                        ticks, era.multiplier
                    ))
                })
        };

        if to <= era.end_tick {
            boosted(to - from)
        } else if from >= era.end_tick {
            Ok(u128::from(to - from))
        } else {
            let head = boosted(era.end_tick - from)?;
            let tail = u128::from(to - era.end_tick);
            head.checked_add(tail).ok_or_else(|| {
                FarmError::ArithmeticOverflow("bonus-weighted tick count".to_string())
            })
        }
    }

    /// Reward minted over `[from, to)` at `rate` per tick.
    ///
    /// Pure: callers persist the tick they accrued up to.
    pub fn mint(&self, from: Tick, to: Tick, rate: Amount) -> Result<Amount, FarmError> {
        let ticks = self.multiplier(from, to)?;
        rate.checked_mul(ticks).ok_or_else(|| {
            FarmError::ArithmeticOverflow(format!(
                "emission of {} per tick over {} weighted ticks",
                rate, ticks
            ))
        })
    }

    /// Global emission over `[from, to)` at the configured rate.
    pub fn total_emission(&self, from: Tick, to: Tick) -> Result<Amount, FarmError> {
        self.mint(from, to, self.rate)
    }
}
