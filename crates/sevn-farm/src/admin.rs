// crates/sevn-farm/src/admin.rs
//
// Owner-only farm configuration.
//
// Every operation here checks the admin capability, then brings all pools up
// to the current tick under the old parameters before changing anything, so
// a parameter change never applies retroactively. Pool updates and the
// change itself are staged on a copy of the registry and committed together
// once the ledger has accepted the fee mints.

use sevn_core::{
    AccountId, AdminCapability, Amount, AssetId, FarmError, LedgerEffect, PoolId, Tick,
    TimeSource, ValueLedger,
};

use crate::farm::Farm;
use crate::fees::{FeeRole, FeeSplit};
use crate::pool::{Pool, PoolRegistry};

impl<L, A, T> Farm<L, A, T>
where
    L: ValueLedger,
    A: AdminCapability,
    T: TimeSource,
{
    /// Register a new pool for `asset` with the given weight.
    ///
    /// # Errors
    /// `Unauthorized`, `InvalidConfig` for a zero weight or for the reward
    /// asset (use `add_staking_pool`), `DuplicateAsset` if the asset already
    /// has a pool.
    pub fn add_pool(
        &mut self,
        caller: &AccountId,
        weight: u64,
        asset: AssetId,
    ) -> Result<PoolId, FarmError> {
        self.require_admin(caller, "add_pool")?;
        if asset == self.reward_asset && !self.registry.contains_asset(&asset) {
            return Err(FarmError::InvalidConfig(format!(
                "{} is the reward asset and must be staked through add_staking_pool",
                asset
            )));
        }
        self.create_pool(weight, asset)
    }

    /// Register the pool staking the reward asset itself, reachable through
    /// `enter_staking` and `leave_staking`. It takes the next free index.
    ///
    /// # Errors
    /// `Unauthorized`, `InvalidConfig` for a zero weight, `DuplicateAsset` if
    /// a staking pool already exists.
    pub fn add_staking_pool(&mut self, caller: &AccountId, weight: u64) -> Result<PoolId, FarmError> {
        self.require_admin(caller, "add_staking_pool")?;
        let pool_id = self.create_pool(weight, self.reward_asset.clone())?;
        self.staking_pool = Some(pool_id);
        Ok(pool_id)
    }

    /// Change a pool's weight. Zero is allowed and stops the pool's emission.
    pub fn set_weight(
        &mut self,
        caller: &AccountId,
        pool_id: PoolId,
        weight: u64,
    ) -> Result<(), FarmError> {
        self.require_admin(caller, "set_weight")?;
        self.registry.get(pool_id)?;

        let now = self.clock.current_tick();
        let (mut registry, effects) = self.staged_update(now)?;
        let mut pool = registry.get(pool_id)?.clone();
        let old_weight = pool.weight;
        pool.weight = weight;
        registry.replace(pool_id, pool)?;
        self.ledger.apply(&effects)?;
        self.registry = registry;

        tracing::info!(
            pool_id,
            old_weight,
            weight,
            total_weight = self.registry.total_weight(),
            "Pool weight changed"
        );
        Ok(())
    }

    /// Change the per-tick emission rate from now on.
    pub fn set_emission_rate(&mut self, caller: &AccountId, rate: Amount) -> Result<(), FarmError> {
        self.require_admin(caller, "set_emission_rate")?;
        self.commit_mass_update()?;
        let old_rate = self.schedule.rate();
        self.schedule.set_rate(rate);
        tracing::info!(old_rate, rate, "Emission rate changed");
        Ok(())
    }

    /// Point one of the auxiliary fee shares at a new account.
    ///
    /// Fees accrued up to now are paid to the previous recipient.
    pub fn set_fee_recipient(
        &mut self,
        caller: &AccountId,
        role: FeeRole,
        account: AccountId,
    ) -> Result<(), FarmError> {
        self.require_admin(caller, "set_fee_recipient")?;
        self.commit_mass_update()?;
        tracing::info!(
            %role,
            old = %self.fees.recipients().get(role),
            new = %account,
            "Fee recipient changed"
        );
        self.fees.set_recipient(role, account);
        Ok(())
    }

    /// Replace the fee split.
    ///
    /// # Errors
    /// `InvalidConfig` unless the percentages sum to 1,000,000; nothing is
    /// updated in that case.
    pub fn set_fee_percentages(&mut self, caller: &AccountId, split: FeeSplit) -> Result<(), FarmError> {
        self.require_admin(caller, "set_fee_percentages")?;
        split.validate()?;
        self.commit_mass_update()?;
        self.fees.set_split(split)?;
        tracing::info!(
            pool_ppm = split.pool_ppm,
            market_ppm = split.market_ppm,
            treasury_ppm = split.treasury_ppm,
            safu_ppm = split.safu_ppm,
            "Fee split changed"
        );
        Ok(())
    }

    fn create_pool(&mut self, weight: u64, asset: AssetId) -> Result<PoolId, FarmError> {
        if weight == 0 {
            return Err(FarmError::InvalidConfig(
                "a new pool needs a non-zero weight".to_string(),
            ));
        }
        if self.registry.contains_asset(&asset) {
            return Err(FarmError::DuplicateAsset(format!(
                "asset {} is already registered",
                asset
            )));
        }

        let now = self.clock.current_tick();
        let (mut registry, effects) = self.staged_update(now)?;
        let first_tick = now.max(self.schedule.start_tick());
        let pool_id = registry.push(Pool::new(asset.clone(), weight, first_tick))?;
        self.ledger.apply(&effects)?;
        self.registry = registry;

        tracing::info!(
            pool_id,
            asset = %asset,
            weight,
            total_weight = self.registry.total_weight(),
            "Pool added"
        );
        Ok(pool_id)
    }

    pub(crate) fn require_admin(&self, caller: &AccountId, op: &str) -> Result<(), FarmError> {
        if !self.admin.is_admin(caller) {
            tracing::warn!(caller = %caller, "Rejected {} from non-admin", op);
            return Err(FarmError::Unauthorized(format!(
                "{} is not allowed to call {}",
                caller, op
            )));
        }
        Ok(())
    }

    /// Copy of the registry with every pool brought up to `now`.
    fn staged_update(&self, now: Tick) -> Result<(PoolRegistry, Vec<LedgerEffect>), FarmError> {
        let (pools, effects) = self.updated_pools(now)?;
        let mut registry = self.registry.clone();
        registry.replace_all(pools)?;
        Ok((registry, effects))
    }

    fn commit_mass_update(&mut self) -> Result<(), FarmError> {
        let now = self.clock.current_tick();
        let (registry, effects) = self.staged_update(now)?;
        self.ledger.apply(&effects)?;
        self.registry = registry;
        Ok(())
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

    fn owner() -> AccountId {
        acct("minter")
    }

    fn farm(start_tick: Tick) -> (Farm<InMemoryLedger, SingleOwner, ManualClock>, ManualClock) {
        let clock = ManualClock::new(0);
        let mut ledger = InMemoryLedger::new(acct("chef"));
        ledger.credit(&AssetId::new("LP"), &acct("bob"), 1000);
        let config = FarmConfig {
            reward_asset: AssetId::new("SEVN"),
            custody: acct("chef"),
            owner: owner(),
            emission_rate: 100,
            start_tick,
            bonus: None,
            fee_split: FeeSplit::pool_only(),
            recipients: FeeRecipients {
                market: acct("dev"),
                treasury: acct("treasury"),
                safu: acct("safu"),
            },
        };
        let farm = Farm::new(config, ledger, SingleOwner::new(owner()), clock.clone()).unwrap();
        (farm, clock)
    }

    #[test]
    fn test_add_pool_requires_admin() {
        let (mut farm, _) = farm(0);
        let err = farm
            .add_pool(&acct("alice"), 100, AssetId::new("LP"))
            .unwrap_err();
        assert!(matches!(err, FarmError::Unauthorized(_)));
        assert_eq!(farm.pool_length(), 0);
    }

    #[test]
    fn test_add_pool_rejects_zero_weight_and_duplicates() {
        let (mut farm, _) = farm(0);
        assert!(matches!(
            farm.add_pool(&owner(), 0, AssetId::new("LP")),
            Err(FarmError::InvalidConfig(_))
        ));
        farm.add_pool(&owner(), 100, AssetId::new("LP")).unwrap();
        assert!(matches!(
            farm.add_pool(&owner(), 100, AssetId::new("LP")),
            Err(FarmError::DuplicateAsset(_))
        ));
        assert!(matches!(
            farm.add_pool(&owner(), 100, AssetId::new("SEVN")),
            Err(FarmError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_add_staking_pool_designates_next_index() {
        let (mut farm, _) = farm(0);
        assert_eq!(farm.add_pool(&owner(), 100, AssetId::new("LP")).unwrap(), 0);
        assert!(matches!(
            farm.add_staking_pool(&acct("bob"), 100),
            Err(FarmError::Unauthorized(_))
        ));
        assert!(matches!(
            farm.add_staking_pool(&owner(), 0),
            Err(FarmError::InvalidConfig(_))
        ));
        assert_eq!(farm.staking_pool(), None);

        assert_eq!(farm.add_staking_pool(&owner(), 50).unwrap(), 1);
        assert_eq!(farm.staking_pool(), Some(1));
        assert_eq!(farm.pool_info(1).unwrap().asset, AssetId::new("SEVN"));
        assert_eq!(farm.total_weight(), 150);
        assert!(matches!(
            farm.add_staking_pool(&owner(), 50),
            Err(FarmError::DuplicateAsset(_))
        ));
        assert!(matches!(
            farm.add_pool(&owner(), 50, AssetId::new("SEVN")),
            Err(FarmError::DuplicateAsset(_))
        ));
    }

    #[test]
    fn test_pool_added_before_start_accrues_from_start() {
        let (mut farm, _) = farm(100);
        let pool_id = farm.add_pool(&owner(), 100, AssetId::new("LP")).unwrap();
        let staking = farm.add_staking_pool(&owner(), 100).unwrap();
        assert_eq!(farm.pool_info(pool_id).unwrap().last_reward_tick, 100);
        assert_eq!(farm.pool_info(staking).unwrap().last_reward_tick, 100);
    }

    #[test]
    fn test_new_pool_does_not_dilute_past_rewards() {
        let (mut farm, clock) = farm(0);
        farm.add_pool(&owner(), 100, AssetId::new("LP")).unwrap();
        farm.deposit(0, &acct("bob"), 100).unwrap();
        clock.set(10);

        farm.add_pool(&owner(), 300, AssetId::new("LP2")).unwrap();
        assert_eq!(farm.pending_reward(0, &acct("bob")).unwrap(), 1000);
        clock.set(20);
        // A quarter of the emission from tick 10 onward.
        assert_eq!(farm.pending_reward(0, &acct("bob")).unwrap(), 1250);
    }

    #[test]
    fn test_set_weight_zero_stops_emission() {
        let (mut farm, clock) = farm(0);
        farm.add_pool(&owner(), 100, AssetId::new("LP")).unwrap();
        farm.deposit(0, &acct("bob"), 100).unwrap();
        clock.set(10);
        farm.set_weight(&owner(), 0, 0).unwrap();
        assert_eq!(farm.total_weight(), 0);
        clock.set(30);
        assert_eq!(farm.pending_reward(0, &acct("bob")).unwrap(), 1000);
    }

    #[test]
    fn test_set_weight_unknown_pool() {
        let (mut farm, _) = farm(0);
        assert!(matches!(
            farm.set_weight(&owner(), 7, 1),
            Err(FarmError::NotFound(_))
        ));
    }

    #[test]
    fn test_set_emission_rate_is_not_retroactive() {
        let (mut farm, clock) = farm(0);
        farm.add_pool(&owner(), 100, AssetId::new("LP")).unwrap();
        farm.deposit(0, &acct("bob"), 100).unwrap();
        clock.set(10);
        farm.set_emission_rate(&owner(), 10).unwrap();
        assert_eq!(farm.emission_rate(), 10);
        clock.set(20);
        assert_eq!(farm.pending_reward(0, &acct("bob")).unwrap(), 1100);
    }

    #[test]
    fn test_set_fee_percentages_validates_sum() {
        let (mut farm, _) = farm(0);
        let bad = FeeSplit {
            pool_ppm: 900_000,
            market_ppm: 50_000,
            treasury_ppm: 50_000,
            safu_ppm: 1,
        };
        assert!(matches!(
            farm.set_fee_percentages(&owner(), bad),
            Err(FarmError::InvalidConfig(_))
        ));
        assert_eq!(farm.fee_split(), FeeSplit::pool_only());
    }

    #[test]
    fn test_fee_recipient_change_pays_old_recipient_first() {
        let (mut farm, clock) = farm(0);
        farm.add_pool(&owner(), 100, AssetId::new("LP")).unwrap();
        farm.set_fee_percentages(
            &owner(),
            FeeSplit {
                pool_ppm: 900_000,
                market_ppm: 100_000,
                treasury_ppm: 0,
                safu_ppm: 0,
            },
        )
        .unwrap();
        farm.deposit(0, &acct("bob"), 100).unwrap();
        clock.set(10);

        farm.set_fee_recipient(&owner(), FeeRole::Market, acct("market2"))
            .unwrap();
        let sevn = AssetId::new("SEVN");
        assert_eq!(farm.ledger().balance(&sevn, &acct("dev")), 100);
        assert_eq!(farm.fee_recipients().market, acct("market2"));

        clock.set(20);
        farm.mass_update_pools().unwrap();
        assert_eq!(farm.ledger().balance(&sevn, &acct("market2")), 100);
    }

    #[test]
    fn test_non_admin_cannot_change_parameters() {
        let (mut farm, _) = farm(0);
        farm.add_pool(&owner(), 100, AssetId::new("LP")).unwrap();
        let mallory = acct("mallory");
        assert!(matches!(
            farm.set_emission_rate(&mallory, 1),
            Err(FarmError::Unauthorized(_))
        ));
        assert!(matches!(
            farm.set_fee_recipient(&mallory, FeeRole::Safu, mallory.clone()),
            Err(FarmError::Unauthorized(_))
        ));
        assert!(matches!(
            farm.set_weight(&mallory, 0, 5),
            Err(FarmError::Unauthorized(_))
        ));
        assert_eq!(farm.emission_rate(), 100);
        assert_eq!(farm.fee_recipients().safu, acct("safu"));
    }
}
