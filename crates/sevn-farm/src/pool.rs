// crates/sevn-farm/src/pool.rs
//
// Pool registry: the ordered set of stakeable assets, their weights
// (allocation points), and their reward accumulators.

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use sevn_core::{Amount, AssetId, FarmError, PoolId, Tick};

/// One stakeable asset and its accumulator state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    /// Asset users stake into this pool.
    pub asset: AssetId,
    /// Allocation points; the pool earns `weight / total_weight` of emission.
    pub weight: u64,
    /// Sum of all positions' principal.
    pub total_staked: Amount,
    /// Cumulative reward per unit of stake, scaled by `ACC_PRECISION`.
    /// Only ever advanced by `Accrual::update_pool`.
    pub acc_reward_per_share: U256,
    /// Tick the accumulator was last brought up to date.
    pub last_reward_tick: Tick,
    /// Pool share accrued but not yet paid to stakers. Settlement never pays
    /// more than this, so rounding in reward debts cannot mint past emission.
    #[serde(default)]
    pub reward_reserve: Amount,
}

impl Pool {
    pub fn new(asset: AssetId, weight: u64, last_reward_tick: Tick) -> Self {
        Self {
            asset,
            weight,
            total_staked: 0,
            acc_reward_per_share: U256::zero(),
            last_reward_tick,
            reward_reserve: 0,
        }
    }

    pub fn info(&self) -> PoolInfo {
        PoolInfo {
            asset: self.asset.clone(),
            weight: self.weight,
            total_staked: self.total_staked,
            acc_reward_per_share: self.acc_reward_per_share,
            last_reward_tick: self.last_reward_tick,
            reward_reserve: self.reward_reserve,
        }
    }
}

/// Read-only view of a pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolInfo {
    pub asset: AssetId,
    pub weight: u64,
    pub total_staked: Amount,
    pub acc_reward_per_share: U256,
    pub last_reward_tick: Tick,
    pub reward_reserve: Amount,
}

/// A user's stake in one pool.
///
/// Positions are never deleted: a zero-amount position is a valid record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPosition {
    /// Principal currently staked.
    pub amount: Amount,
    /// `amount * acc_reward_per_share / ACC_PRECISION` as of the last
    /// settlement; reward already accounted for.
    pub reward_debt: Amount,
}

/// Ordered collection of pools with total-weight bookkeeping.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoolRegistry {
    pools: Vec<Pool>,
    total_weight: u128,
}

impl PoolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    /// Sum of all pool weights.
    pub fn total_weight(&self) -> u128 {
        self.total_weight
    }

    pub fn pools(&self) -> &[Pool] {
        &self.pools
    }

    pub fn contains_asset(&self, asset: &AssetId) -> bool {
        self.pools.iter().any(|p| p.asset == *asset)
    }

    /// # Errors
    /// Returns `FarmError::NotFound` for an unknown index.
    pub fn get(&self, pool_id: PoolId) -> Result<&Pool, FarmError> {
        self.pools
            .get(pool_id as usize)
            .ok_or_else(|| FarmError::NotFound(format!("pool {} does not exist", pool_id)))
    }

    /// Register a new pool and return its index.
    ///
    /// # Errors
    /// Returns `FarmError::DuplicateAsset` if any pool already holds the asset.
    pub fn push(&mut self, pool: Pool) -> Result<PoolId, FarmError> {
        if self.contains_asset(&pool.asset) {
            return Err(FarmError::DuplicateAsset(format!(
                "asset {} is already registered",
                pool.asset
            )));
        }
        let pool_id = PoolId::try_from(self.pools.len())
            .map_err(|_| FarmError::ArithmeticOverflow("pool index space exhausted".to_string()))?;
        self.total_weight += u128::from(pool.weight);
        self.pools.push(pool);
        Ok(pool_id)
    }

    /// Replace a pool's state, keeping total weight in sync with its weight.
    ///
    /// # Errors
    /// Returns `FarmError::NotFound` for an unknown index, or
    /// `FarmError::InvalidState` if the asset would change.
    pub fn replace(&mut self, pool_id: PoolId, pool: Pool) -> Result<(), FarmError> {
        let slot = self
            .pools
            .get_mut(pool_id as usize)
            .ok_or_else(|| FarmError::NotFound(format!("pool {} does not exist", pool_id)))?;
        if slot.asset != pool.asset {
            return Err(FarmError::InvalidState(format!(
                "pool {} is bound to {}, not {}",
                pool_id, slot.asset, pool.asset
            )));
        }
        self.total_weight = self.total_weight - u128::from(slot.weight) + u128::from(pool.weight);
        *slot = pool;
        Ok(())
    }

    /// Replace every pool at once, e.g. after a mass update.
    ///
    /// # Errors
    /// Returns `FarmError::InvalidState` if the count or any asset differs.
    pub fn replace_all(&mut self, pools: Vec<Pool>) -> Result<(), FarmError> {
        if pools.len() != self.pools.len() {
            return Err(FarmError::InvalidState(format!(
                "expected {} pools, got {}",
                self.pools.len(),
                pools.len()
            )));
        }
        if let Some((pool_id, _)) = self
            .pools
            .iter()
            .zip(&pools)
            .enumerate()
            .find(|(_, (old, new))| old.asset != new.asset)
        {
            return Err(FarmError::InvalidState(format!(
                "pool {} changed asset during replacement",
                pool_id
            )));
        }
        self.total_weight = pools.iter().map(|p| u128::from(p.weight)).sum();
        self.pools = pools;
        Ok(())
    }
}
