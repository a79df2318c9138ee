// crates/sevn-farm/src/token.rs
//
// Fixed-point constants and checked wide arithmetic for reward accounting.
//
// Amounts are u128 in the token's smallest unit. The per-share accumulator is
// scaled by ACC_PRECISION and stored as U256; every product is formed in 256
// bits and divided with floor rounding. Nothing here wraps or saturates:
// results that do not fit come back as ArithmeticOverflow.

use primitive_types::U256;

use sevn_core::{Amount, FarmError};

/// Scale factor S of `acc_reward_per_share` (10^18).
pub const ACC_PRECISION: u128 = 1_000_000_000_000_000_000;

/// Fee percentages are parts-per-million; the four of them sum to this.
pub const PPM_DENOMINATOR: u32 = 1_000_000;

/// `a * b / denominator` in 256 bits, floor-rounded.
pub fn mul_div(a: U256, b: U256, denominator: U256) -> Result<U256, FarmError> {
    if denominator.is_zero() {
        return Err(FarmError::ArithmeticOverflow(
            "division by zero in mul_div".to_string(),
        ));
    }
    let product = a.checked_mul(b).ok_or_else(|| {
        FarmError::ArithmeticOverflow(format!("{} * {} exceeds 256 bits", a, b))
    })?;
    Ok(product / denominator)
}

/// Narrow a 256-bit intermediate back to an amount.
pub fn to_amount(value: U256, what: &str) -> Result<Amount, FarmError> {
    if value > U256::from(u128::MAX) {
        return Err(FarmError::ArithmeticOverflow(format!(
            "{} ({}) does not fit in 128 bits",
            what, value
        )));
    }
    Ok(value.low_u128())
}

/// `amount * acc / ACC_PRECISION`: total reward a stake has earned against an
/// accumulator value. Used for both pending reward and reward debt.
pub fn accrued(amount: Amount, acc_reward_per_share: U256) -> Result<Amount, FarmError> {
    let value = mul_div(
        U256::from(amount),
        acc_reward_per_share,
        U256::from(ACC_PRECISION),
    )?;
    to_amount(value, "accrued reward")
}

/// `reward * ACC_PRECISION / total_staked`: accumulator increment.
pub fn per_share(reward: Amount, total_staked: Amount) -> Result<U256, FarmError> {
    mul_div(
        U256::from(reward),
        U256::from(ACC_PRECISION),
        U256::from(total_staked),
    )
}
