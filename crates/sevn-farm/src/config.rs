// crates/sevn-farm/src/config.rs
//
// Farm configuration.
// Loaded from a TOML file or built in code; validated before the farm starts.

use serde::Deserialize;
use std::fs;

use sevn_core::{AccountId, Amount, AssetId, FarmError, Tick};

use crate::emission::{BonusEra, EmissionSchedule};
use crate::fees::{FeeRecipients, FeeSplit, FeeSplitter};

/// Genesis parameters of a farm.
///
/// ```toml
/// reward_asset = "SEVN"
/// custody = "chef"
/// owner = "minter"
/// emission_rate = 2220000000000000000
/// start_tick = 1700000000
///
/// [fee_split]
/// pool_ppm = 793200
/// market_ppm = 57400
/// treasury_ppm = 114900
/// safu_ppm = 34500
///
/// [recipients]
/// market = "market"
/// treasury = "treasury"
/// safu = "safu"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct FarmConfig {
    /// Token minted as reward; also the asset of the staking pool.
    pub reward_asset: AssetId,

    /// The farm's own account on the ledger, holding staked principal.
    pub custody: AccountId,

    /// Account holding the admin capability at genesis.
    pub owner: AccountId,

    /// Reward minted per tick across all pools.
    pub emission_rate: Amount,

    /// No reward accrues before this tick.
    #[serde(default)]
    pub start_tick: Tick,

    /// Optional boosted era right after the start tick.
    #[serde(default)]
    pub bonus: Option<BonusEra>,

    /// Parts-per-million split of every minted reward.
    #[serde(default = "default_fee_split")]
    pub fee_split: FeeSplit,

    pub recipients: FeeRecipients,
}

fn default_fee_split() -> FeeSplit {
    FeeSplit::pool_only()
}

impl FarmConfig {
    /// Load configuration from a TOML file at the given path.
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        tracing::info!("Loaded farm configuration from {}", path);
        Ok(config)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: FarmConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the engine relies on.
    ///
    /// # Errors
    /// Returns `FarmError::InvalidConfig` for a fee split not summing to
    /// 1,000,000 ppm or a zero bonus multiplier.
    pub fn validate(&self) -> Result<(), FarmError> {
        self.fee_split.validate()?;
        self.schedule().map(|_| ())
    }

    pub(crate) fn schedule(&self) -> Result<EmissionSchedule, FarmError> {
        EmissionSchedule::new(self.emission_rate, self.start_tick, self.bonus)
    }

    pub(crate) fn splitter(&self) -> Result<FeeSplitter, FarmError> {
        FeeSplitter::new(self.fee_split, self.recipients.clone())
    }
}
