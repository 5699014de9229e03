/// Reserve-derived prices and the price-impact estimates used by the guard.
///
/// Prices are token1 per token0 in 18-decimal fixed point. Square-root
/// prices are Q64.64.

use aegis_types::{HookError, HookResult, BPS_DENOMINATOR, PRICE_PRECISION};
use ethnum::U256;

use crate::safe::{full_mul, mul_div_u128, sqrt_u256, u256_to_u128};

// ============================================================================
// Reserve Derived Values
// ============================================================================

/// Constant-product invariant r0 * r1
pub fn invariant(reserve0: u128, reserve1: u128) -> U256 {
    full_mul(reserve0, reserve1)
}

/// reserve1 * 1e18 / reserve0, or 0 for an empty pool. Ratios past the
/// u128 range saturate at `u128::MAX`.
pub fn price_from_reserves(reserve0: u128, reserve1: u128) -> HookResult<u128> {
    if reserve0 == 0 {
        return Ok(0);
    }
    let price = full_mul(reserve1, PRICE_PRECISION) / U256::from(reserve0);
    Ok(if price > U256::from(u128::MAX) { u128::MAX } else { price.as_u128() })
}

/// sqrt(reserve1 / reserve0) in Q64.64
pub fn sqrt_price_from_reserves(reserve0: u128, reserve1: u128) -> HookResult<u128> {
    if reserve0 == 0 {
        return Err(HookError::DivisionByZero { operation: "sqrt price from reserves" });
    }
    let ratio_x128 = (U256::from(reserve1) << 128) / U256::from(reserve0);
    u256_to_u128(sqrt_u256(ratio_x128), "sqrt price from reserves")
}

/// Liquidity of a full-range position holding the reserves: sqrt(r0 * r1)
pub fn liquidity_from_reserves(reserve0: u128, reserve1: u128) -> HookResult<u128> {
    u256_to_u128(sqrt_u256(invariant(reserve0, reserve1)), "liquidity from reserves")
}

// ============================================================================
// Output and Impact Estimates
// ============================================================================

/// Output a swap of `amount_in` would receive at `price`, ignoring curvature
pub fn expected_output(amount_in: u128, price: u128, zero_for_one: bool) -> HookResult<u128> {
    if zero_for_one {
        mul_div_u128(amount_in, price, PRICE_PRECISION)
    } else {
        if price == 0 {
            return Err(HookError::DivisionByZero { operation: "expected output" });
        }
        mul_div_u128(amount_in, PRICE_PRECISION, price)
    }
}

/// |expected - actual| / expected in basis points. A zero expectation with
/// a non-zero actual saturates at 100%.
pub fn price_impact_bps(expected: u128, actual: u128) -> HookResult<u64> {
    if expected == 0 {
        return Ok(if actual == 0 { 0 } else { BPS_DENOMINATOR });
    }
    let diff = expected.abs_diff(actual);
    let bps = mul_div_u128(diff, BPS_DENOMINATOR as u128, expected)?;
    Ok(bps.min(u64::MAX as u128) as u64)
}

/// Impact implied by a swap limit: output at the limit price against output
/// at the current price. The ratio does not depend on the input amount, so
/// it is evaluated on the squared sqrt prices directly.
pub fn price_impact_from_limit(
    current_sqrt_price_x64: u128,
    limit_sqrt_price_x64: u128,
    zero_for_one: bool,
) -> HookResult<u64> {
    let current = full_mul(current_sqrt_price_x64, current_sqrt_price_x64);
    let limit = full_mul(limit_sqrt_price_x64, limit_sqrt_price_x64);

    // token0 in: output scales with price. token1 in: output scales with 1/price.
    let reference = if zero_for_one { current } else { limit };
    if reference == U256::ZERO {
        return Err(HookError::DivisionByZero { operation: "limit price impact" });
    }

    let diff = if current > limit { current - limit } else { limit - current };
    let bps = diff * U256::from(BPS_DENOMINATOR as u128) / reference;
    Ok(if bps > U256::from(u64::MAX as u128) { u64::MAX } else { bps.as_u64() })
}
