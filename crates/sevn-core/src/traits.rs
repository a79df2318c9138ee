// crates/sevn-core/src/traits.rs

use serde::{Deserialize, Serialize};

use crate::error::FarmError;
use crate::identity::{AccountId, AssetId};
use crate::{Amount, Tick};

/// A single movement of value the farm asks the ledger to perform.
///
/// Operations collect their effects in order and hand the whole batch to
/// [`ValueLedger::apply`]; farm state is only committed once the batch has
/// been accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEffect {
    /// Move `amount` of `asset` from `from` into the farm's custody.
    TransferIn {
        asset: AssetId,
        from: AccountId,
        amount: Amount,
    },
    /// Move `amount` of `asset` out of custody to `to`.
    TransferOut {
        asset: AssetId,
        to: AccountId,
        amount: Amount,
    },
    /// Create `amount` of `asset` and credit it to `to`.
    Mint {
        asset: AssetId,
        to: AccountId,
        amount: Amount,
    },
}

/// Trait for the underlying value-transfer ledger (token contract).
///
/// Implemented by `sevn_farm::memory::InMemoryLedger`.
pub trait ValueLedger: Send + Sync {
    /// The farm's own account: destination of `transfer_in`, source of
    /// `transfer_out`.
    fn custody(&self) -> &AccountId;

    /// Pull `amount` of `asset` from `from` into custody.
    fn transfer_in(&mut self, asset: &AssetId, from: &AccountId, amount: Amount)
        -> Result<(), FarmError>;

    /// Pay `amount` of `asset` out of custody to `to`.
    fn transfer_out(&mut self, asset: &AssetId, to: &AccountId, amount: Amount)
        -> Result<(), FarmError>;

    /// Mint `amount` of `asset` to `to`.
    fn mint(&mut self, asset: &AssetId, to: &AccountId, amount: Amount) -> Result<(), FarmError>;

    /// Apply a batch of effects in order.
    ///
    /// The default stops at the first failure. Ledgers that can stage writes
    /// should override this so a failed batch leaves no trace.
    fn apply(&mut self, effects: &[LedgerEffect]) -> Result<(), FarmError> {
        for effect in effects {
            match effect {
                LedgerEffect::TransferIn {
                    asset,
                    from,
                    amount,
                } => self.transfer_in(asset, from, *amount)?,
                LedgerEffect::TransferOut { asset, to, amount } => {
                    self.transfer_out(asset, to, *amount)?
                }
                LedgerEffect::Mint { asset, to, amount } => self.mint(asset, to, *amount)?,
            }
        }
        Ok(())
    }
}

/// Capability check consulted before every admin mutation.
pub trait AdminCapability: Send + Sync {
    /// Returns `true` if `caller` may perform admin operations.
    fn is_admin(&self, caller: &AccountId) -> bool;
}

/// Supplies the current tick. Must never go backwards.
pub trait TimeSource: Send + Sync {
    fn current_tick(&self) -> Tick;
}

/// Ownable-style capability: exactly one account is the admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleOwner {
    owner: AccountId,
}

impl SingleOwner {
    pub fn new(owner: AccountId) -> Self {
        Self { owner }
    }

    pub fn owner(&self) -> &AccountId {
        &self.owner
    }

    /// Hand the capability to a new account.
    pub fn transfer_ownership(&mut self, new_owner: AccountId) {
        self.owner = new_owner;
    }
}

impl AdminCapability for SingleOwner {
    fn is_admin(&self, caller: &AccountId) -> bool {
        *caller == self.owner
    }
}
