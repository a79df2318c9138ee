// crates/sevn-core/src/lib.rs
//
// sevn-core: Core types, errors, and collaborator traits for the SEVN yield farm.
//
// This is the leaf crate that the farm engine depends on. It defines the
// identity newtypes, the protocol-wide error type, and the interfaces of the
// external collaborators the engine talks to: the value-transfer ledger, the
// admin capability check, and the tick source.

pub mod clock;
pub mod error;
pub mod identity;
pub mod traits;

/// Abstract time unit (block height or UNIX timestamp) that drives accrual.
pub type Tick = u64;

/// Token amount in the smallest indivisible unit.
pub type Amount = u128;

/// Index of a pool, assigned at creation and never reused.
pub type PoolId = u32;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use sevn_core::AccountId;`
pub use clock::{ManualClock, SystemClock};
pub use error::FarmError;
pub use identity::{AccountId, AssetId};
pub use traits::{AdminCapability, LedgerEffect, SingleOwner, TimeSource, ValueLedger};
