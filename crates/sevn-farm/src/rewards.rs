// crates/sevn-farm/src/rewards.rs
//
// Reward settlement engine.
//
// Each pool carries a running accumulator, `acc_reward_per_share`: the reward
// one unit of stake has earned since the pool was created, scaled by
// ACC_PRECISION. Bringing a pool up to date mints the emission for the
// elapsed ticks, routes the fee shares to their recipients, and adds the pool
// share divided by the pool's total stake to the accumulator. A user's
// pending reward is then
//
//     amount * acc_reward_per_share / ACC_PRECISION - reward_debt
//
// and settling it resets `reward_debt` to the first term. Every step is O(1)
// in the number of elapsed ticks.
//
// Reward debts are floored, so a position opened while the accumulator holds
// a fraction is later credited with that fraction. Summed over positions the
// formula can run a few units ahead of the pool share. Each pool therefore
// keeps a reserve of accrued-but-unpaid reward, and settlement pays at most
// what the reserve holds.
//
// Functions here work on pool and position values and queue ledger effects;
// they never touch farm storage. The caller commits the returned state only
// after the ledger has accepted the queued effects.

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use sevn_core::{AccountId, Amount, AssetId, FarmError, LedgerEffect, Tick};

use crate::emission::EmissionSchedule;
use crate::fees::{FeeShares, FeeSplitter};
use crate::pool::{Pool, UserPosition};
use crate::token::{accrued, mul_div, per_share, to_amount};

/// Parameters in force while a pool accrues: schedule, fee split, total weight.
pub struct Accrual<'a> {
    pub schedule: &'a EmissionSchedule,
    pub fees: &'a FeeSplitter,
    pub reward_asset: &'a AssetId,
    pub total_weight: u128,
}

impl Accrual<'_> {
    /// Per-tick emission for a pool of the given weight, floor-rounded.
    pub fn pool_rate(&self, weight: u64) -> Result<Amount, FarmError> {
        if self.total_weight == 0 {
            return Ok(0);
        }
        let rate = mul_div(
            U256::from(self.schedule.rate()),
            U256::from(weight),
            U256::from(self.total_weight),
        )?;
        to_amount(rate, "pool emission rate")
    }

    /// Bring `pool` up to `now`.
    ///
    /// Idempotent at a given tick. An empty pool only moves its
    /// `last_reward_tick`: emission for that interval is forgone. Fee mints
    /// are appended to `effects`; the returned shares are for logging and
    /// tests.
    pub fn update_pool(
        &self,
        pool: &mut Pool,
        now: Tick,
        effects: &mut Vec<LedgerEffect>,
    ) -> Result<FeeShares, FarmError> {
        if now <= pool.last_reward_tick {
            return Ok(FeeShares::default());
        }
        if pool.total_staked == 0 {
            pool.last_reward_tick = now;
            return Ok(FeeShares::default());
        }

        let rate = self.pool_rate(pool.weight)?;
        let minted = self.schedule.mint(pool.last_reward_tick, now, rate)?;
        let shares = self.fees.split(minted)?;

        if shares.pool > 0 {
            let increment = per_share(shares.pool, pool.total_staked)?;
            pool.acc_reward_per_share =
                pool.acc_reward_per_share.checked_add(increment).ok_or_else(|| {
                    FarmError::ArithmeticOverflow(format!(
                        "acc_reward_per_share of pool {} exceeds 256 bits",
                        pool.asset
                    ))
                })?;
        }
        pool.reward_reserve = pool.reward_reserve.checked_add(shares.pool).ok_or_else(|| {
            FarmError::ArithmeticOverflow(format!("reward reserve of pool {}", pool.asset))
        })?;
        self.fees.push_fee_mints(self.reward_asset, &shares, effects);
        pool.last_reward_tick = now;

        tracing::trace!(
            asset = %pool.asset,
            minted,
            pool_share = shares.pool,
            "Pool accrued to tick {}",
            now
        );
        Ok(shares)
    }
}

/// Reward owed to `position` against the pool's current accumulator.
///
/// # Errors
/// Returns `FarmError::InvalidState` if the reward debt exceeds the accrued
/// total. That can only happen if the accumulator went backwards or a debt was
/// set inconsistently, so it is reported rather than clamped.
pub fn pending(position: &UserPosition, pool: &Pool) -> Result<Amount, FarmError> {
    let total = accrued(position.amount, pool.acc_reward_per_share)?;
    total.checked_sub(position.reward_debt).ok_or_else(|| {
        tracing::error!(
            asset = %pool.asset,
            amount = position.amount,
            reward_debt = position.reward_debt,
            accrued = total,
            "Reward debt exceeds accrued reward"
        );
        FarmError::InvalidState(format!(
            "reward debt {} exceeds accrued reward {} in pool {}",
            position.reward_debt, total, pool.asset
        ))
    })
}

/// Reward debt for `amount` at the given accumulator.
pub fn reward_debt(amount: Amount, pool: &Pool) -> Result<Amount, FarmError> {
    accrued(amount, pool.acc_reward_per_share)
}

/// Outcome of settling one position: updated copies plus queued effects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub pool: Pool,
    pub position: UserPosition,
    /// Reward paid by this settlement, already taken out of the pool reserve.
    pub pending: Amount,
    /// Fee mints from the pool update, in order.
    pub effects: Vec<LedgerEffect>,
}

impl Settlement {
    /// Queue a mint of the pending reward to `to`, if any.
    pub fn pay_pending(&mut self, reward_asset: &AssetId, to: &AccountId) {
        if self.pending > 0 {
            self.effects.push(LedgerEffect::Mint {
                asset: reward_asset.clone(),
                to: to.clone(),
                amount: self.pending,
            });
        }
    }

    /// Apply a stake change and reset the reward debt, so pending is zero.
    pub fn rebase(&mut self, new_amount: Amount) -> Result<(), FarmError> {
        self.position.amount = new_amount;
        self.position.reward_debt = reward_debt(new_amount, &self.pool)?;
        Ok(())
    }
}

/// Update the pool to `now`, then compute the position's pending reward,
/// capped by the pool's reserve and deducted from it.
///
/// Works on copies: `pool` and `position` are left untouched.
pub fn settle(
    accrual: &Accrual<'_>,
    pool: &Pool,
    position: &UserPosition,
    now: Tick,
) -> Result<Settlement, FarmError> {
    let mut pool = pool.clone();
    let mut effects = Vec::new();
    accrual.update_pool(&mut pool, now, &mut effects)?;
    let owed = pending(position, &pool)?;
    let pending = owed.min(pool.reward_reserve);
    if pending < owed {
        tracing::debug!(
            asset = %pool.asset,
            owed,
            reserve = pool.reward_reserve,
            "Settlement capped by pool reserve"
        );
    }
    pool.reward_reserve -= pending;
    Ok(Settlement {
        pool,
        position: *position,
        pending,
        effects,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fees::{FeeRecipients, FeeSplit};
    use crate::token::ACC_PRECISION;

    struct Fixture {
        schedule: EmissionSchedule,
        fees: FeeSplitter,
        asset: AssetId,
    }

    impl Fixture {
        fn new(rate: Amount, split: FeeSplit) -> Self {
            Self {
                schedule: EmissionSchedule::new(rate, 0, None).unwrap(),
                fees: FeeSplitter::new(
                    split,
                    FeeRecipients {
                        market: AccountId::new("dev"),
                        treasury: AccountId::new("treasury"),
                        safu: AccountId::new("safu"),
                    },
                )
                .unwrap(),
                asset: AssetId::new("SEVN"),
            }
        }

        fn accrual(&self, total_weight: u128) -> Accrual<'_> {
            Accrual {
                schedule: &self.schedule,
                fees: &self.fees,
                reward_asset: &self.asset,
                total_weight,
            }
        }
    }

    fn staked_pool(total_staked: Amount) -> Pool {
        let mut pool = Pool::new(AssetId::new("LP"), 100, 0);
        pool.total_staked = total_staked;
        pool
    }

    #[test]
    fn test_update_pool_accrues_pool_share() {
        let fixture = Fixture::new(100, FeeSplit::pool_only());
        let accrual = fixture.accrual(100);
        let mut pool = staked_pool(100);
        let mut effects = Vec::new();

        let shares = accrual.update_pool(&mut pool, 10, &mut effects).unwrap();
        assert_eq!(shares.pool, 1000);
        assert!(effects.is_empty());
        assert_eq!(pool.acc_reward_per_share, U256::from(10 * ACC_PRECISION));
        assert_eq!(pool.last_reward_tick, 10);
    }

    #[test]
    fn test_update_pool_same_tick_is_noop() {
        let fixture = Fixture::new(100, FeeSplit::pool_only());
        let accrual = fixture.accrual(100);
        let mut pool = staked_pool(100);
        let mut effects = Vec::new();
        accrual.update_pool(&mut pool, 10, &mut effects).unwrap();
        let snapshot = pool.clone();

        accrual.update_pool(&mut pool, 10, &mut effects).unwrap();
        accrual.update_pool(&mut pool, 5, &mut effects).unwrap();
        assert_eq!(pool, snapshot);
    }

    #[test]
    fn test_update_empty_pool_forgoes_emission() {
        let fixture = Fixture::new(100, FeeSplit::pool_only());
        let accrual = fixture.accrual(100);
        let mut pool = staked_pool(0);
        let mut effects = Vec::new();

        accrual.update_pool(&mut pool, 50, &mut effects).unwrap();
        assert_eq!(pool.acc_reward_per_share, U256::zero());
        assert_eq!(pool.last_reward_tick, 50);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_update_pool_prorates_by_weight() {
        let fixture = Fixture::new(100, FeeSplit::pool_only());
        // Pool weight 100 out of 400 total: 25 per tick.
        let accrual = fixture.accrual(400);
        let mut pool = staked_pool(50);
        let mut effects = Vec::new();

        let shares = accrual.update_pool(&mut pool, 4, &mut effects).unwrap();
        assert_eq!(shares.pool, 100);
        assert_eq!(pool.acc_reward_per_share, U256::from(2 * ACC_PRECISION));
    }

    #[test]
    fn test_update_pool_with_zero_total_weight_accrues_nothing() {
        let fixture = Fixture::new(100, FeeSplit::pool_only());
        let accrual = fixture.accrual(0);
        let mut pool = staked_pool(50);
        let mut effects = Vec::new();
        accrual.update_pool(&mut pool, 4, &mut effects).unwrap();
        assert_eq!(pool.acc_reward_per_share, U256::zero());
        assert_eq!(pool.last_reward_tick, 4);
    }

    #[test]
    fn test_update_pool_mints_fee_shares() {
        let fixture = Fixture::new(
            1000,
            FeeSplit {
                pool_ppm: 700_000,
                market_ppm: 100_000,
                treasury_ppm: 150_000,
                safu_ppm: 50_000,
            },
        );
        let accrual = fixture.accrual(100);
        let mut pool = staked_pool(7);
        let mut effects = Vec::new();

        accrual.update_pool(&mut pool, 1, &mut effects).unwrap();
        assert_eq!(pool.acc_reward_per_share, U256::from(100 * ACC_PRECISION));
        let minted: Vec<(String, Amount)> = effects
            .iter()
            .map(|e| match e {
                LedgerEffect::Mint { to, amount, .. } => (to.to_string(), *amount),
                other => panic!("unexpected effect {:?}", other),
            })
            .collect();
        assert_eq!(
            minted,
            vec![
                ("dev".to_string(), 100),
                ("treasury".to_string(), 150),
                ("safu".to_string(), 50),
            ]
        );
    }

    #[test]
    fn test_settle_and_rebase_zeroes_pending() {
        let fixture = Fixture::new(100, FeeSplit::pool_only());
        let accrual = fixture.accrual(100);
        let pool = staked_pool(100);
        let position = UserPosition {
            amount: 100,
            reward_debt: 0,
        };

        let mut settlement = settle(&accrual, &pool, &position, 10).unwrap();
        assert_eq!(settlement.pending, 1000);
        // Inputs are untouched.
        assert_eq!(pool.last_reward_tick, 0);

        settlement.rebase(150).unwrap();
        assert_eq!(pending(&settlement.position, &settlement.pool).unwrap(), 0);
        assert_eq!(settlement.position.reward_debt, 1500);
    }

    #[test]
    fn test_pay_pending_queues_mint_only_when_positive() {
        let fixture = Fixture::new(100, FeeSplit::pool_only());
        let accrual = fixture.accrual(100);
        let pool = staked_pool(100);
        let empty = UserPosition::default();

        let mut settlement = settle(&accrual, &pool, &empty, 10).unwrap();
        settlement.pay_pending(&fixture.asset, &AccountId::new("bob"));
        assert!(settlement.effects.is_empty());
    }

    #[test]
    fn test_pending_with_inconsistent_debt_fails_loudly() {
        let pool = staked_pool(100);
        let position = UserPosition {
            amount: 10,
            reward_debt: 1,
        };
        assert!(matches!(
            pending(&position, &pool),
            Err(FarmError::InvalidState(_))
        ));
    }

    #[test]
    fn test_update_pool_fills_reserve_and_settle_drains_it() {
        let fixture = Fixture::new(100, FeeSplit::pool_only());
        let accrual = fixture.accrual(100);
        let pool = staked_pool(100);
        let position = UserPosition {
            amount: 100,
            reward_debt: 0,
        };

        let settlement = settle(&accrual, &pool, &position, 10).unwrap();
        assert_eq!(settlement.pending, 1000);
        assert_eq!(settlement.pool.reward_reserve, 0);
    }

    #[test]
    fn test_settle_never_pays_past_reserve() {
        let fixture = Fixture::new(100, FeeSplit::pool_only());
        let accrual = fixture.accrual(100);
        // Accumulator says 1.5 per unit, but only 120 is left in the reserve.
        let mut pool = staked_pool(100);
        pool.acc_reward_per_share = U256::from(ACC_PRECISION + ACC_PRECISION / 2);
        pool.reward_reserve = 120;
        let position = UserPosition {
            amount: 100,
            reward_debt: 0,
        };

        let settlement = settle(&accrual, &pool, &position, 0).unwrap();
        assert_eq!(settlement.pending, 120);
        assert_eq!(settlement.pool.reward_reserve, 0);
    }

    #[test]
    fn test_accumulator_is_monotonic() {
        let fixture = Fixture::new(37, FeeSplit::pool_only());
        let accrual = fixture.accrual(100);
        let mut pool = staked_pool(13);
        let mut effects = Vec::new();
        let mut last = pool.acc_reward_per_share;
        for tick in [1, 1, 2, 9, 9, 100, 10_000, 10_000_000] {
            accrual.update_pool(&mut pool, tick, &mut effects).unwrap();
            assert!(pool.acc_reward_per_share >= last);
            last = pool.acc_reward_per_share;
        }
    }
}
