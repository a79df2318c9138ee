// crates/sevn-farm/src/lib.rs
//
// sevn-farm: multi-pool staking with time-based reward emission for SEVN.
//
// Users stake an asset into a pool and earn a weight-proportional share of
// the per-tick SEVN emission. Each minted amount is split four ways between
// the pool's stakers and the market, treasury, and safu accounts. An
// optional staking pool stakes SEVN itself and compounds through enter/leave
// staking.
//
// All token amounts are u128 in the smallest unit; per-share accumulators are
// 256-bit and scaled by ACC_PRECISION (10^18).

pub mod admin;
pub mod config;
pub mod emission;
pub mod farm;
pub mod fees;
pub mod memory;
pub mod pool;
pub mod rewards;
pub mod shared;
pub mod staking;
pub mod token;

// Re-export key types for ergonomic access from downstream crates.
pub use config::FarmConfig;
pub use emission::{BonusEra, EmissionSchedule};
pub use farm::Farm;
pub use fees::{FeeRecipients, FeeRole, FeeShares, FeeSplit, FeeSplitter};
pub use memory::InMemoryLedger;
pub use pool::{Pool, PoolInfo, PoolRegistry, UserPosition};
pub use rewards::{pending, Accrual, Settlement};
pub use shared::SharedFarm;
pub use token::{ACC_PRECISION, PPM_DENOMINATOR};
