/// Safe arithmetic operations with overflow protection
///
/// All operations return errors instead of panicking. Products of two
/// `u128` values go through `U256` intermediates.

use aegis_types::{HookError, HookResult};
use ethnum::U256;

// ============================================================================
// Safe Basic Arithmetic
// ============================================================================

/// Checked u128 addition, naming the operation on overflow
pub fn safe_add_u128(a: u128, b: u128, operation: &'static str) -> HookResult<u128> {
    a.checked_add(b).ok_or(HookError::overflow(operation))
}

/// Checked u128 subtraction, naming the operation on underflow
pub fn safe_sub_u128(a: u128, b: u128, operation: &'static str) -> HookResult<u128> {
    a.checked_sub(b).ok_or(HookError::overflow(operation))
}

/// Apply a signed delta to an unsigned reserve. A decrease larger than the
/// reserve is reported as `InsufficientReserve`, not as an underflow.
pub fn apply_signed_delta(reserve: u128, delta: i128) -> HookResult<u128> {
    if delta >= 0 {
        reserve
            .checked_add(delta as u128)
            .ok_or(HookError::overflow("reserve increase"))
    } else {
        let requested = delta.unsigned_abs();
        if requested > reserve {
            return Err(HookError::InsufficientReserve {
                requested,
                available: reserve,
            });
        }
        Ok(reserve - requested)
    }
}

// ============================================================================
// 256-bit Intermediates
// ============================================================================

/// Narrow a U256 back to u128
pub fn u256_to_u128(value: U256, operation: &'static str) -> HookResult<u128> {
    if value > U256::from(u128::MAX) {
        return Err(HookError::overflow(operation));
    }
    Ok(value.as_u128())
}

/// Full-precision product of two u128 values
pub fn full_mul(a: u128, b: u128) -> U256 {
    U256::from(a) * U256::from(b)
}

/// a * b / denominator, rounded down, with a 256-bit intermediate
pub fn mul_div_u128(a: u128, b: u128, denominator: u128) -> HookResult<u128> {
    if denominator == 0 {
        return Err(HookError::DivisionByZero { operation: "mul_div" });
    }
    let result = full_mul(a, b) / U256::from(denominator);
    u256_to_u128(result, "mul_div")
}

/// Integer square root of a U256 (Newton's method, rounded down)
pub fn sqrt_u256(n: U256) -> U256 {
    if n == U256::ZERO {
        return U256::ZERO;
    }

    let mut x = n;
    // ceil(n / 2) without the n + 1 overflow at U256::MAX
    let mut y = (x >> 1) + (x & U256::ONE);
    while y < x {
        x = y;
        y = (x + n / x) >> 1;
    }
    x
}

/// Calculate percentage (basis points)
pub fn safe_calculate_bps(value: u128, bps: u64) -> HookResult<u128> {
    mul_div_u128(value, bps as u128, aegis_types::BPS_DENOMINATOR as u128)
}
