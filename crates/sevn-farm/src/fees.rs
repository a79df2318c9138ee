// crates/sevn-farm/src/fees.rs
//
// Four-way split of every minted reward.
//
// Minted reward is divided between the pool (its stakers) and three
// auxiliary recipients: market, treasury, and safu. Percentages are
// parts-per-million and must sum to exactly 1,000,000. Each share is computed
// independently with floor division, so the four shares can fall short of
// the minted total by at most 3 units. That remainder is never minted.
//
// The auxiliary shares are minted straight to their recipients. The pool
// share is not minted here: it only raises the pool accumulator and is
// minted later, to whichever user settles it.

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

use sevn_core::{AccountId, Amount, AssetId, FarmError, LedgerEffect};

use crate::token::{mul_div, to_amount, PPM_DENOMINATOR};

/// Fee-split percentages in parts-per-million.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSplit {
    pub pool_ppm: u32,
    pub market_ppm: u32,
    pub treasury_ppm: u32,
    pub safu_ppm: u32,
}

impl FeeSplit {
    /// Everything goes to stakers.
    pub fn pool_only() -> Self {
        Self {
            pool_ppm: PPM_DENOMINATOR,
            market_ppm: 0,
            treasury_ppm: 0,
            safu_ppm: 0,
        }
    }

    /// # Errors
    /// Returns `FarmError::InvalidConfig` unless the four values sum to 1,000,000.
    pub fn validate(&self) -> Result<(), FarmError> {
        let sum = u64::from(self.pool_ppm)
            + u64::from(self.market_ppm)
            + u64::from(self.treasury_ppm)
            + u64::from(self.safu_ppm);
        if sum != u64::from(PPM_DENOMINATOR) {
            return Err(FarmError::InvalidConfig(format!(
                "fee percentages sum to {} ppm, expected {}",
                sum, PPM_DENOMINATOR
            )));
        }
        Ok(())
    }
}

/// The three auxiliary recipient slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeRole {
    Market,
    Treasury,
    Safu,
}

impl fmt::Display for FeeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeeRole::Market => write!(f, "market"),
            FeeRole::Treasury => write!(f, "treasury"),
            FeeRole::Safu => write!(f, "safu"),
        }
    }
}

/// Accounts receiving the auxiliary shares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRecipients {
    pub market: AccountId,
    pub treasury: AccountId,
    pub safu: AccountId,
}

impl FeeRecipients {
    pub fn get(&self, role: FeeRole) -> &AccountId {
        match role {
            FeeRole::Market => &self.market,
            FeeRole::Treasury => &self.treasury,
            FeeRole::Safu => &self.safu,
        }
    }

    pub fn set(&mut self, role: FeeRole, account: AccountId) {
        match role {
            FeeRole::Market => self.market = account,
            FeeRole::Treasury => self.treasury = account,
            FeeRole::Safu => self.safu = account,
        }
    }
}

/// Result of splitting one minted amount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeShares {
    pub pool: Amount,
    pub market: Amount,
    pub treasury: Amount,
    pub safu: Amount,
}

impl FeeShares {
    /// Sum of the four shares. Never exceeds the split amount.
    pub fn total(&self) -> Amount {
        self.pool + self.market + self.treasury + self.safu
    }
}

/// Validated split plus the recipients it pays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSplitter {
    split: FeeSplit,
    recipients: FeeRecipients,
}

impl FeeSplitter {
    /// # Errors
    /// Returns `FarmError::InvalidConfig` if the percentages do not sum to 1,000,000.
    pub fn new(split: FeeSplit, recipients: FeeRecipients) -> Result<Self, FarmError> {
        split.validate()?;
        Ok(Self { split, recipients })
    }

    pub fn split_config(&self) -> FeeSplit {
        self.split
    }

    pub fn recipients(&self) -> &FeeRecipients {
        &self.recipients
    }

    pub(crate) fn set_split(&mut self, split: FeeSplit) -> Result<(), FarmError> {
        split.validate()?;
        self.split = split;
        Ok(())
    }

    pub(crate) fn set_recipient(&mut self, role: FeeRole, account: AccountId) {
        self.recipients.set(role, account);
    }

    /// Split `total_minted` by floor division, each share independently.
    pub fn split(&self, total_minted: Amount) -> Result<FeeShares, FarmError> {
        let share = |ppm: u32| -> Result<Amount, FarmError> {
            let value = mul_div(
                U256::from(total_minted),
                U256::from(ppm),
                U256::from(PPM_DENOMINATOR),
            )?;
            to_amount(value, "fee share")
        };

        Ok(FeeShares {
            pool: share(self.split.pool_ppm)?,
            market: share(self.split.market_ppm)?,
            treasury: share(self.split.treasury_ppm)?,
            safu: share(self.split.safu_ppm)?,
        })
    }

    /// Queue mints of the auxiliary shares. Zero shares produce no effect.
    pub fn push_fee_mints(
        &self,
        reward_asset: &AssetId,
        shares: &FeeShares,
        effects: &mut Vec<LedgerEffect>,
    ) {
        let payouts = [
            (FeeRole::Market, shares.market),
            (FeeRole::Treasury, shares.treasury),
            (FeeRole::Safu, shares.safu),
        ];
        for (role, amount) in payouts {
            if amount > 0 {
                effects.push(LedgerEffect::Mint {
                    asset: reward_asset.clone(),
                    to: self.recipients.get(role).clone(),
                    amount,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipients() -> FeeRecipients {
        FeeRecipients {
            market: AccountId::new("dev"),
            treasury: AccountId::new("treasury"),
            safu: AccountId::new("safu"),
        }
    }

    fn launch_split() -> FeeSplit {
        FeeSplit {
            pool_ppm: 793_200,
            market_ppm: 57_400,
            treasury_ppm: 114_900,
            safu_ppm: 34_500,
        }
    }

    #[test]
    fn test_validate_accepts_exact_million() {
        assert!(launch_split().validate().is_ok());
        assert!(FeeSplit::pool_only().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_sum() {
        let mut split = launch_split();
        split.safu_ppm += 1;
        assert!(matches!(split.validate(), Err(FarmError::InvalidConfig(_))));
        assert!(FeeSplitter::new(split, recipients()).is_err());
    }

    #[test]
    fn test_split_exact_shares() {
        let splitter = FeeSplitter::new(launch_split(), recipients()).unwrap();
        let shares = splitter.split(200_000_000_000_000_000_000).unwrap();
        assert_eq!(shares.pool, 158_640_000_000_000_000_000);
        assert_eq!(shares.market, 11_480_000_000_000_000_000);
        assert_eq!(shares.treasury, 22_980_000_000_000_000_000);
        assert_eq!(shares.safu, 6_900_000_000_000_000_000);
        assert_eq!(shares.total(), 200_000_000_000_000_000_000);
    }

    #[test]
    fn test_split_rounding_loss_is_at_most_three() {
        let splitter = FeeSplitter::new(
            FeeSplit {
                pool_ppm: 250_001,
                market_ppm: 250_001,
                treasury_ppm: 250_001,
                safu_ppm: 249_997,
            },
            recipients(),
        )
        .unwrap();
        for total in [1u128, 3, 7, 999, 1_000_001, 123_456_789] {
            let shares = splitter.split(total).unwrap();
            assert!(shares.total() <= total);
            assert!(total - shares.total() <= 3, "loss too large for {}", total);
        }
    }

    #[test]
    fn test_push_fee_mints_skips_zero_shares() {
        let splitter = FeeSplitter::new(
            FeeSplit {
                pool_ppm: 900_000,
                market_ppm: 100_000,
                treasury_ppm: 0,
                safu_ppm: 0,
            },
            recipients(),
        )
        .unwrap();
        let shares = splitter.split(1_000).unwrap();
        let mut effects = Vec::new();
        splitter.push_fee_mints(&AssetId::new("SEVN"), &shares, &mut effects);
        assert_eq!(
            effects,
            vec![LedgerEffect::Mint {
                asset: AssetId::new("SEVN"),
                to: AccountId::new("dev"),
                amount: 100,
            }]
        );
    }

    #[test]
    fn test_recipient_slots_are_independent() {
        let mut r = recipients();
        r.set(FeeRole::Treasury, AccountId::new("bob"));
        assert_eq!(r.get(FeeRole::Treasury), &AccountId::new("bob"));
        assert_eq!(r.get(FeeRole::Market), &AccountId::new("dev"));
        assert_eq!(r.get(FeeRole::Safu), &AccountId::new("safu"));
    }
}
