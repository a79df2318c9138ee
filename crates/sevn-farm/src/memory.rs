// crates/sevn-farm/src/memory.rs
//
// In-memory value-transfer ledger.
//
// Keeps a balance per (asset, account) and a minted total per asset. Batches
// are applied to a staged copy and swapped in only when every effect
// succeeds, so a failed farm operation leaves balances exactly as they were.

use std::collections::HashMap;

use sevn_core::{AccountId, Amount, AssetId, FarmError, LedgerEffect, ValueLedger};

/// Balance table with a designated custody account.
#[derive(Debug, Clone)]
pub struct InMemoryLedger {
    custody: AccountId,
    balances: HashMap<(AssetId, AccountId), Amount>,
    minted: HashMap<AssetId, Amount>,
}

impl InMemoryLedger {
    /// Create an empty ledger whose custody account is `custody`.
    pub fn new(custody: AccountId) -> Self {
        Self {
            custody,
            balances: HashMap::new(),
            minted: HashMap::new(),
        }
    }

    /// Seed an account balance without counting it as minted reward.
    pub fn credit(&mut self, asset: &AssetId, account: &AccountId, amount: Amount) {
        *self
            .balances
            .entry((asset.clone(), account.clone()))
            .or_default() += amount;
    }

    pub fn balance(&self, asset: &AssetId, account: &AccountId) -> Amount {
        self.balances
            .get(&(asset.clone(), account.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// Total ever minted of `asset` through [`ValueLedger::mint`].
    pub fn total_minted(&self, asset: &AssetId) -> Amount {
        self.minted.get(asset).copied().unwrap_or(0)
    }

    fn debit(&mut self, asset: &AssetId, account: &AccountId, amount: Amount) -> Result<(), FarmError> {
        let key = (asset.clone(), account.clone());
        let available = self.balances.get(&key).copied().unwrap_or(0);
        if available < amount {
            return Err(FarmError::TransferFailed(format!(
                "{} holds {} {} but {} was requested",
                account, available, asset, amount
            )));
        }
        self.balances.insert(key, available - amount);
        Ok(())
    }

    fn checked_credit(
        &mut self,
        asset: &AssetId,
        account: &AccountId,
        amount: Amount,
    ) -> Result<(), FarmError> {
        let entry = self
            .balances
            .entry((asset.clone(), account.clone()))
            .or_default();
        *entry = entry.checked_add(amount).ok_or_else(|| {
            FarmError::TransferFailed(format!("{} balance of {} would overflow", asset, account))
        })?;
        Ok(())
    }
}

impl ValueLedger for InMemoryLedger {
    fn custody(&self) -> &AccountId {
        &self.custody
    }

    fn transfer_in(
        &mut self,
        asset: &AssetId,
        from: &AccountId,
        amount: Amount,
    ) -> Result<(), FarmError> {
        self.debit(asset, from, amount)?;
        let custody = self.custody.clone();
        self.checked_credit(asset, &custody, amount)
    }

    fn transfer_out(
        &mut self,
        asset: &AssetId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), FarmError> {
        let custody = self.custody.clone();
        self.debit(asset, &custody, amount)?;
        self.checked_credit(asset, to, amount)
    }

    fn mint(&mut self, asset: &AssetId, to: &AccountId, amount: Amount) -> Result<(), FarmError> {
        let supply = self.minted.entry(asset.clone()).or_default();
        *supply = supply.checked_add(amount).ok_or_else(|| {
            FarmError::TransferFailed(format!("{} supply would overflow", asset))
        })?;
        self.checked_credit(asset, to, amount)
    }

    fn apply(&mut self, effects: &[LedgerEffect]) -> Result<(), FarmError> {
        let mut staged = self.clone();
        for effect in effects {
            let result = match effect {
                LedgerEffect::TransferIn {
                    asset,
                    from,
                    amount,
                } => staged.transfer_in(asset, from, *amount),
                LedgerEffect::TransferOut { asset, to, amount } => {
                    staged.transfer_out(asset, to, *amount)
                }
                LedgerEffect::Mint { asset, to, amount } => staged.mint(asset, to, *amount),
            };
            if let Err(e) = result {
                tracing::warn!("Ledger batch of {} effects rejected: {}", effects.len(), e);
                return Err(e);
            }
        }
        *self = staged;
        Ok(())
    }
}
