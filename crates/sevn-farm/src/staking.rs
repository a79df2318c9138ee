// crates/sevn-farm/src/staking.rs
//
// Reward-token staking.
//
// The staking pool stakes the reward asset itself, so its entry points can
// settle and compound in one step: the pending reward is minted into custody
// and only the net difference between what the user brings and what they are
// owed moves across the ledger.

use sevn_core::{
    AccountId, AdminCapability, Amount, FarmError, LedgerEffect, PoolId, TimeSource, ValueLedger,
};

use crate::farm::{checked_add, Farm};

impl<L, A, T> Farm<L, A, T>
where
    L: ValueLedger,
    A: AdminCapability,
    T: TimeSource,
{
    /// Stake `amount` of the reward asset. Returns the reward settled.
    ///
    /// If the pending reward exceeds `amount` the surplus is paid out;
    /// otherwise only `amount - pending` is pulled from the user.
    ///
    /// # Errors
    /// `NotFound` if no staking pool has been added.
    pub fn enter_staking(&mut self, user: &AccountId, amount: Amount) -> Result<Amount, FarmError> {
        let pool_id = self.require_staking_pool()?;
        let now = self.clock.current_tick();
        let mut settlement = self.settle(pool_id, user, now)?;
        let pending = settlement.pending;
        self.mint_to_custody(&mut settlement.effects, pending);

        if amount > pending {
            settlement.effects.push(LedgerEffect::TransferIn {
                asset: self.reward_asset.clone(),
                from: user.clone(),
                amount: amount - pending,
            });
        } else if pending > amount {
            settlement.effects.push(LedgerEffect::TransferOut {
                asset: self.reward_asset.clone(),
                to: user.clone(),
                amount: pending - amount,
            });
        }

        let new_amount = checked_add(settlement.position.amount, amount, "staked amount")?;
        settlement.pool.total_staked =
            checked_add(settlement.pool.total_staked, amount, "staking pool total")?;
        settlement.rebase(new_amount)?;

        self.commit(pool_id, user, settlement)?;
        tracing::debug!(user = %user, amount, pending, "Entered staking at tick {}", now);
        Ok(pending)
    }

    /// Unstake `amount` of the reward asset together with the pending reward.
    /// Returns the reward settled.
    ///
    /// # Errors
    /// `InsufficientBalance` if `amount` exceeds the staked amount, `NotFound`
    /// if no staking pool has been added.
    pub fn leave_staking(&mut self, user: &AccountId, amount: Amount) -> Result<Amount, FarmError> {
        let pool_id = self.require_staking_pool()?;
        let now = self.clock.current_tick();
        let staked = self.user_info(pool_id, user)?.amount;
        if amount > staked {
            return Err(FarmError::InsufficientBalance {
                requested: amount,
                available: staked,
            });
        }

        let mut settlement = self.settle(pool_id, user, now)?;
        let pending = settlement.pending;
        self.mint_to_custody(&mut settlement.effects, pending);

        let payout = checked_add(amount, pending, "staking payout")?;
        if payout > 0 {
            settlement.effects.push(LedgerEffect::TransferOut {
                asset: self.reward_asset.clone(),
                to: user.clone(),
                amount: payout,
            });
        }

        settlement.pool.total_staked -= amount;
        settlement.rebase(staked - amount)?;

        self.commit(pool_id, user, settlement)?;
        tracing::debug!(user = %user, amount, pending, "Left staking at tick {}", now);
        Ok(pending)
    }

    fn require_staking_pool(&self) -> Result<PoolId, FarmError> {
        self.staking_pool
            .ok_or_else(|| FarmError::NotFound("no staking pool has been added".to_string()))
    }

    fn mint_to_custody(&self, effects: &mut Vec<LedgerEffect>, amount: Amount) {
        if amount > 0 {
            effects.push(LedgerEffect::Mint {
                asset: self.reward_asset.clone(),
                to: self.custody.clone(),
                amount,
            });
        }
    }
}
