// crates/sevn-farm/src/shared.rs
//
// SharedFarm: a farm handle that can be cloned into many tokio tasks.
//
// Operations on a Farm must run one at a time. The handle serializes
// mutations behind a write lock; queries take a read lock and may run
// concurrently with each other.

use std::sync::Arc;

use tokio::sync::RwLock;

use sevn_core::{AccountId, AdminCapability, Amount, AssetId, FarmError, PoolId, TimeSource, ValueLedger};

use crate::farm::Farm;
use crate::fees::{FeeRole, FeeSplit};
use crate::pool::{PoolInfo, UserPosition};

/// Cloneable, task-safe handle to a [`Farm`].
pub struct SharedFarm<L, A, T> {
    inner: Arc<RwLock<Farm<L, A, T>>>,
}

impl<L, A, T> Clone for SharedFarm<L, A, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L, A, T> SharedFarm<L, A, T>
where
    L: ValueLedger,
    A: AdminCapability,
    T: TimeSource,
{
    pub fn new(farm: Farm<L, A, T>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(farm)),
        }
    }

    /// Direct access to the underlying lock, for callers that need several
    /// operations under one guard.
    pub fn lock(&self) -> &Arc<RwLock<Farm<L, A, T>>> {
        &self.inner
    }

    pub async fn deposit(&self, pool_id: PoolId, user: &AccountId, amount: Amount) -> Result<Amount, FarmError> {
        self.inner.write().await.deposit(pool_id, user, amount)
    }

    pub async fn withdraw(&self, pool_id: PoolId, user: &AccountId, amount: Amount) -> Result<Amount, FarmError> {
        self.inner.write().await.withdraw(pool_id, user, amount)
    }

    pub async fn emergency_withdraw(&self, pool_id: PoolId, user: &AccountId) -> Result<Amount, FarmError> {
        self.inner.write().await.emergency_withdraw(pool_id, user)
    }

    pub async fn enter_staking(&self, user: &AccountId, amount: Amount) -> Result<Amount, FarmError> {
        self.inner.write().await.enter_staking(user, amount)
    }

    pub async fn leave_staking(&self, user: &AccountId, amount: Amount) -> Result<Amount, FarmError> {
        self.inner.write().await.leave_staking(user, amount)
    }

    pub async fn mass_update_pools(&self) -> Result<(), FarmError> {
        self.inner.write().await.mass_update_pools()
    }

    pub async fn add_pool(&self, caller: &AccountId, weight: u64, asset: AssetId) -> Result<PoolId, FarmError> {
        self.inner.write().await.add_pool(caller, weight, asset)
    }

    pub async fn set_weight(&self, caller: &AccountId, pool_id: PoolId, weight: u64) -> Result<(), FarmError> {
        self.inner.write().await.set_weight(caller, pool_id, weight)
    }

    pub async fn set_emission_rate(&self, caller: &AccountId, rate: Amount) -> Result<(), FarmError> {
        self.inner.write().await.set_emission_rate(caller, rate)
    }

    pub async fn set_fee_recipient(
        &self,
        caller: &AccountId,
        role: FeeRole,
        account: AccountId,
    ) -> Result<(), FarmError> {
        self.inner.write().await.set_fee_recipient(caller, role, account)
    }

    pub async fn set_fee_percentages(&self, caller: &AccountId, split: FeeSplit) -> Result<(), FarmError> {
        self.inner.write().await.set_fee_percentages(caller, split)
    }

    pub async fn pending_reward(&self, pool_id: PoolId, user: &AccountId) -> Result<Amount, FarmError> {
        self.inner.read().await.pending_reward(pool_id, user)
    }

    pub async fn pool_info(&self, pool_id: PoolId) -> Result<PoolInfo, FarmError> {
        self.inner.read().await.pool_info(pool_id)
    }

    pub async fn user_info(&self, pool_id: PoolId, user: &AccountId) -> Result<UserPosition, FarmError> {
        self.inner.read().await.user_info(pool_id, user)
    }

    pub async fn pool_length(&self) -> usize {
        self.inner.read().await.pool_length()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FarmConfig;
    use crate::fees::FeeRecipients;
    use crate::memory::InMemoryLedger;
    use sevn_core::{ManualClock, SingleOwner};

    fn acct(name: &str) -> AccountId {
        AccountId::new(name)
    }

    #[tokio::test]
    async fn test_concurrent_deposits_are_serialized() {
        let clock = ManualClock::new(0);
        let lp = AssetId::new("LP");
        let mut ledger = InMemoryLedger::new(acct("chef"));
        let users: Vec<AccountId> = (0..8).map(|i| acct(&format!("user{}", i))).collect();
        for user in &users {
            ledger.credit(&lp, user, 100);
        }
        let config = FarmConfig {
            reward_asset: AssetId::new("SEVN"),
            custody: acct("chef"),
            owner: acct("minter"),
            emission_rate: 80,
            start_tick: 0,
            bonus: None,
            fee_split: FeeSplit::pool_only(),
            recipients: FeeRecipients {
                market: acct("dev"),
                treasury: acct("treasury"),
                safu: acct("safu"),
            },
        };
        let farm = Farm::new(config, ledger, SingleOwner::new(acct("minter")), clock.clone()).unwrap();
        let shared = SharedFarm::new(farm);
        let pool_id = shared.add_pool(&acct("minter"), 1, lp.clone()).await.unwrap();

        let mut handles = Vec::new();
        for user in users.clone() {
            let shared = shared.clone();
            handles.push(tokio::spawn(async move {
                shared.deposit(pool_id, &user, 100).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(shared.pool_info(pool_id).await.unwrap().total_staked, 800);
        clock.set(10);
        for user in &users {
            assert_eq!(shared.pending_reward(pool_id, user).await.unwrap(), 100);
        }
        let guard = shared.lock().read().await;
        assert_eq!(guard.ledger().balance(&lp, &acct("chef")), 800);
    }
}
