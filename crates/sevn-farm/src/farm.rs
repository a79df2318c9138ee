// crates/sevn-farm/src/farm.rs
//
// The farm engine: pools, positions, and the user-facing stake operations.
//
// Every mutation follows the same shape:
//   1. read the tick from the TimeSource,
//   2. compute the new pool/position values on copies, queueing ledger
//      effects (fee mints, reward mint, principal transfers) in order,
//   3. hand the batch to the ValueLedger,
//   4. commit the copies only if the ledger accepted the batch.
// A failed operation therefore leaves no trace in farm state.
//
// Admin operations live in admin.rs and the reward-token staking entry points
// in staking.rs; both are further `impl Farm` blocks.

use std::collections::HashMap;

use sevn_core::{
    AccountId, AdminCapability, Amount, AssetId, FarmError, LedgerEffect, PoolId, SingleOwner,
    Tick, TimeSource, ValueLedger,
};

use crate::config::FarmConfig;
use crate::emission::EmissionSchedule;
use crate::fees::{FeeRecipients, FeeSplit, FeeSplitter};
use crate::pool::{Pool, PoolInfo, PoolRegistry, UserPosition};
use crate::rewards::{self, Accrual, Settlement};

/// Multi-pool staking farm.
///
/// Generic over its collaborators: `L` moves value, `A` answers the admin
/// capability check, `T` supplies ticks.
pub struct Farm<L, A, T> {
    pub(crate) ledger: L,
    pub(crate) admin: A,
    pub(crate) clock: T,
    pub(crate) reward_asset: AssetId,
    pub(crate) custody: AccountId,
    pub(crate) schedule: EmissionSchedule,
    pub(crate) fees: FeeSplitter,
    pub(crate) registry: PoolRegistry,
    /// Pool staking the reward asset, once designated by `add_staking_pool`.
    pub(crate) staking_pool: Option<PoolId>,
    pub(crate) positions: HashMap<(PoolId, AccountId), UserPosition>,
}

impl<L, A, T> Farm<L, A, T>
where
    L: ValueLedger,
    A: AdminCapability,
    T: TimeSource,
{
    /// Create a farm with no pools.
    ///
    /// # Errors
    /// Returns `FarmError::InvalidConfig` if the configuration does not
    /// validate or names a custody account other than the ledger's.
    pub fn new(config: FarmConfig, ledger: L, admin: A, clock: T) -> Result<Self, FarmError> {
        config.validate()?;
        if ledger.custody() != &config.custody {
            return Err(FarmError::InvalidConfig(format!(
                "custody account {} does not match ledger custody {}",
                config.custody,
                ledger.custody()
            )));
        }
        let schedule = config.schedule()?;
        let fees = config.splitter()?;
        let now = clock.current_tick();

        tracing::info!(
            reward_asset = %config.reward_asset,
            emission_rate = schedule.rate(),
            start_tick = schedule.start_tick(),
            "Farm initialized at tick {}",
            now
        );

        Ok(Self {
            ledger,
            admin,
            clock,
            reward_asset: config.reward_asset,
            custody: config.custody,
            schedule,
            fees,
            registry: PoolRegistry::new(),
            staking_pool: None,
            positions: HashMap::new(),
        })
    }

    // ------------------------------------------------------------------
    // User operations
    // ------------------------------------------------------------------

    /// Stake `amount` of the pool's asset, paying out pending reward first.
    ///
    /// A zero `amount` only claims. Returns the reward paid.
    ///
    /// # Errors
    /// `InvalidState` for the staking pool (use `enter_staking`), `NotFound`
    /// for an unknown pool, `TransferFailed` if the ledger rejects the batch.
    pub fn deposit(
        &mut self,
        pool_id: PoolId,
        user: &AccountId,
        amount: Amount,
    ) -> Result<Amount, FarmError> {
        self.reject_staking_pool(pool_id, "deposit", "enter_staking")?;
        let now = self.clock.current_tick();

        let mut settlement = self.settle(pool_id, user, now)?;
        settlement.pay_pending(&self.reward_asset, user);
        if amount > 0 {
            settlement.effects.push(LedgerEffect::TransferIn {
                asset: settlement.pool.asset.clone(),
                from: user.clone(),
                amount,
            });
        }
        let new_amount = checked_add(settlement.position.amount, amount, "position amount")?;
        settlement.pool.total_staked =
            checked_add(settlement.pool.total_staked, amount, "pool total staked")?;
        settlement.rebase(new_amount)?;

        let paid = settlement.pending;
        self.commit(pool_id, user, settlement)?;
        tracing::debug!(pool_id, user = %user, amount, paid, "Deposit at tick {}", now);
        Ok(paid)
    }

    /// Unstake `amount`, paying out pending reward. Returns the reward paid.
    ///
    /// # Errors
    /// `InsufficientBalance` if `amount` exceeds the position, plus the
    /// errors of [`Farm::deposit`].
    pub fn withdraw(
        &mut self,
        pool_id: PoolId,
        user: &AccountId,
        amount: Amount,
    ) -> Result<Amount, FarmError> {
        self.reject_staking_pool(pool_id, "withdraw", "leave_staking")?;
        let now = self.clock.current_tick();

        let staked = self.user_info(pool_id, user)?.amount;
        if amount > staked {
            return Err(FarmError::InsufficientBalance {
                requested: amount,
                available: staked,
            });
        }

        let mut settlement = self.settle(pool_id, user, now)?;
        settlement.pay_pending(&self.reward_asset, user);
        if amount > 0 {
            settlement.effects.push(LedgerEffect::TransferOut {
                asset: settlement.pool.asset.clone(),
                to: user.clone(),
                amount,
            });
        }
        settlement.pool.total_staked -= amount;
        settlement.rebase(staked - amount)?;

        let paid = settlement.pending;
        self.commit(pool_id, user, settlement)?;
        tracing::debug!(pool_id, user = %user, amount, paid, "Withdraw at tick {}", now);
        Ok(paid)
    }

    /// Return the whole principal without settling. Pending reward is
    /// forfeited. Works on every pool, the staking pool included.
    /// Returns the principal returned.
    pub fn emergency_withdraw(&mut self, pool_id: PoolId, user: &AccountId) -> Result<Amount, FarmError> {
        let mut pool = self.registry.get(pool_id)?.clone();
        let position = self.user_info(pool_id, user)?;
        let amount = position.amount;

        let mut effects = Vec::new();
        if amount > 0 {
            effects.push(LedgerEffect::TransferOut {
                asset: pool.asset.clone(),
                to: user.clone(),
                amount,
            });
        }
        pool.total_staked = pool.total_staked.checked_sub(amount).ok_or_else(|| {
            FarmError::InvalidState(format!(
                "pool {} stakes {} but position holds {}",
                pool_id, pool.total_staked, amount
            ))
        })?;

        self.ledger.apply(&effects)?;
        self.registry.replace(pool_id, pool)?;
        self.positions
            .insert((pool_id, user.clone()), UserPosition::default());

        tracing::warn!(pool_id, user = %user, amount, "Emergency withdraw, pending reward forfeited");
        Ok(amount)
    }

    /// Bring every pool up to the current tick. Anyone may call this.
    pub fn mass_update_pools(&mut self) -> Result<(), FarmError> {
        let now = self.clock.current_tick();
        let (pools, effects) = self.updated_pools(now)?;
        self.ledger.apply(&effects)?;
        self.registry.replace_all(pools)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Reward `user` would receive if they settled now. Read-only.
    pub fn pending_reward(&self, pool_id: PoolId, user: &AccountId) -> Result<Amount, FarmError> {
        let now = self.clock.current_tick();
        Ok(self.settle(pool_id, user, now)?.pending)
    }

    pub fn pool_info(&self, pool_id: PoolId) -> Result<PoolInfo, FarmError> {
        Ok(self.registry.get(pool_id)?.info())
    }

    /// The user's position; a never-touched position reads as zero.
    pub fn user_info(&self, pool_id: PoolId, user: &AccountId) -> Result<UserPosition, FarmError> {
        self.registry.get(pool_id)?;
        Ok(self
            .positions
            .get(&(pool_id, user.clone()))
            .copied()
            .unwrap_or_default())
    }

    /// Index of the reward-token staking pool, if one has been added.
    pub fn staking_pool(&self) -> Option<PoolId> {
        self.staking_pool
    }

    pub fn pool_length(&self) -> usize {
        self.registry.len()
    }

    pub fn total_weight(&self) -> u128 {
        self.registry.total_weight()
    }

    pub fn emission_rate(&self) -> Amount {
        self.schedule.rate()
    }

    pub fn schedule(&self) -> &EmissionSchedule {
        &self.schedule
    }

    pub fn fee_split(&self) -> FeeSplit {
        self.fees.split_config()
    }

    pub fn fee_recipients(&self) -> &FeeRecipients {
        self.fees.recipients()
    }

    pub fn reward_asset(&self) -> &AssetId {
        &self.reward_asset
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn admin(&self) -> &A {
        &self.admin
    }

    pub fn current_tick(&self) -> Tick {
        self.clock.current_tick()
    }

    // ------------------------------------------------------------------
    // Internal helpers
    // ------------------------------------------------------------------

    pub(crate) fn accrual(&self) -> Accrual<'_> {
        Accrual {
            schedule: &self.schedule,
            fees: &self.fees,
            reward_asset: &self.reward_asset,
            total_weight: self.registry.total_weight(),
        }
    }

    pub(crate) fn settle(
        &self,
        pool_id: PoolId,
        user: &AccountId,
        now: Tick,
    ) -> Result<Settlement, FarmError> {
        let pool = self.registry.get(pool_id)?;
        let position = self.user_info(pool_id, user)?;
        rewards::settle(&self.accrual(), pool, &position, now)
    }

    /// Copies of every pool brought up to `now`, with the fee mints they owe.
    pub(crate) fn updated_pools(&self, now: Tick) -> Result<(Vec<Pool>, Vec<LedgerEffect>), FarmError> {
        let accrual = self.accrual();
        let mut pools = self.registry.pools().to_vec();
        let mut effects = Vec::new();
        for pool in pools.iter_mut() {
            accrual.update_pool(pool, now, &mut effects)?;
        }
        Ok((pools, effects))
    }

    /// Apply the settlement's ledger effects, then store its pool and position.
    pub(crate) fn commit(
        &mut self,
        pool_id: PoolId,
        user: &AccountId,
        settlement: Settlement,
    ) -> Result<(), FarmError> {
        self.ledger.apply(&settlement.effects)?;
        self.registry.replace(pool_id, settlement.pool)?;
        self.positions
            .insert((pool_id, user.clone()), settlement.position);
        Ok(())
    }

    fn reject_staking_pool(&self, pool_id: PoolId, op: &str, instead: &str) -> Result<(), FarmError> {
        if self.staking_pool == Some(pool_id) {
            return Err(FarmError::InvalidState(format!(
                "{} on the staking pool must go through {}",
                op, instead
            )));
        }
        Ok(())
    }
}

impl<L, T> Farm<L, SingleOwner, T>
where
    L: ValueLedger,
    T: TimeSource,
{
    /// Create a farm administered by the configured `owner`.
    pub fn from_config(config: FarmConfig, ledger: L, clock: T) -> Result<Self, FarmError> {
        let admin = SingleOwner::new(config.owner.clone());
        Self::new(config, ledger, admin, clock)
    }

    /// Current holder of the admin capability.
    pub fn owner(&self) -> &AccountId {
        self.admin.owner()
    }

    /// Hand the admin capability to `new_owner`. Only the current owner may
    /// call this.
    pub fn transfer_ownership(
        &mut self,
        caller: &AccountId,
        new_owner: AccountId,
    ) -> Result<(), FarmError> {
        self.require_admin(caller, "transfer_ownership")?;
        tracing::info!(old = %caller, new = %new_owner, "Ownership transferred");
        self.admin.transfer_ownership(new_owner);
        Ok(())
    }
}

pub(crate) fn checked_add(a: Amount, b: Amount, what: &str) -> Result<Amount, FarmError> {
    a.checked_add(b)
        .ok_or_else(|| FarmError::ArithmeticOverflow(format!("{} overflows 128 bits", what)))
}
