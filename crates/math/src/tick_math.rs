/// Conversions between ticks and Q64.64 sqrt prices.
///
/// A tick is the coarse price bucket `floor(log_{1.0001}(price))`. The pool
/// stores it next to the sqrt price for observers; the guard never relies on
/// it for pricing.

use aegis_types::{HookError, HookResult, MAX_SQRT_PRICE_X64, MAX_TICK, MIN_SQRT_PRICE_X64, MIN_TICK};
use ethnum::U256;

// Precision for the fractional part of log2
const BIT_PRECISION: u32 = 14;

// log_2(sqrt(1.0001)) in Q32.32 format
const LOG_B_2_X32: i128 = 59543866431248;

// Error margins for the logarithm approximation
const LOG_B_P_ERR_MARGIN_LOWER_X64: i128 = 184467440737095516; // 0.01
const LOG_B_P_ERR_MARGIN_UPPER_X64: i128 = 15793534762490258745; // 2^-precision / log_2_b + 0.01

/// sqrt(1.0001) for an odd/even tick, Q96
const POSITIVE_BASE_X96: [u128; 2] = [
    79228162514264337593543950336,
    79232123823359799118286999567,
];

/// sqrt(1.0001)^(2^i) for i in 1..=18, Q96
const POSITIVE_FACTORS_X96: [u128; 18] = [
    79236085330515764027303304731,
    79244008939048815603706035061,
    79259858533276714757314932305,
    79291567232598584799939703904,
    79355022692464371645785046466,
    79482085999252804386437311141,
    79736823300114093921829183326,
    80248749790819932309965073892,
    81282483887344747381513967011,
    83390072131320151908154831281,
    87770609709833776024991924138,
    97234110755111693312479820773,
    119332217159966728226237229890,
    179736315981702064433883588727,
    407748233172238350107850275304,
    2098478828474011932436660412517,
    55581415166113811149459800483533,
    38992368544603139932233054999993551,
];

/// 1/sqrt(1.0001) for an odd/even tick, Q64
const NEGATIVE_BASE_X64: [u128; 2] = [18446744073709551616, 18445821805675392311];

/// 1/sqrt(1.0001)^(2^i) for i in 1..=18, Q64
const NEGATIVE_FACTORS_X64: [u128; 18] = [
    18444899583751176498,
    18443055278223354162,
    18439367220385604838,
    18431993317065449817,
    18417254355718160513,
    18387811781193591352,
    18329067761203520168,
    18212142134806087854,
    17980523815641551639,
    17526086738831147013,
    16651378430235024244,
    15030750278693429944,
    12247334978882834399,
    8131365268884726200,
    3584323654723342297,
    696457651847595233,
    26294789957452057,
    37481735321082,
];

/// Sqrt price (Q64.64) at a tick
pub fn sqrt_price_at_tick(tick: i32) -> HookResult<u128> {
    if !is_tick_valid(tick) {
        return Err(HookError::InvalidTick { tick });
    }

    let abs_tick = tick.unsigned_abs();
    if tick >= 0 {
        let mut ratio = POSITIVE_BASE_X96[(abs_tick & 1) as usize];
        for (bit, factor) in POSITIVE_FACTORS_X96.iter().enumerate() {
            if abs_tick & (2 << bit) != 0 {
                ratio = mul_shift_96(ratio, *factor);
            }
        }
        Ok(ratio >> 32)
    } else {
        let mut ratio = NEGATIVE_BASE_X64[(abs_tick & 1) as usize];
        for (bit, factor) in NEGATIVE_FACTORS_X64.iter().enumerate() {
            if abs_tick & (2 << bit) != 0 {
                ratio = (ratio * factor) >> 64;
            }
        }
        Ok(ratio)
    }
}

/// Greatest tick whose sqrt price does not exceed `sqrt_price_x64`
pub fn tick_at_sqrt_price(sqrt_price_x64: u128) -> HookResult<i32> {
    if !is_sqrt_price_valid(sqrt_price_x64) {
        return Err(HookError::InvalidPrice {
            sqrt_price_x64,
            min: MIN_SQRT_PRICE_X64,
            max: MAX_SQRT_PRICE_X64,
        });
    }

    // Integer part of log2 from the most significant bit
    let msb: u32 = 128 - sqrt_price_x64.leading_zeros() - 1;
    let log2p_integer_x32 = (msb as i128 - 64) << 32;

    // Fractional part: normalise to Q1.63 and square repeatedly
    let mut bit: i128 = 0x8000_0000_0000_0000i128;
    let mut precision = 0;
    let mut log2p_fraction_x64 = 0;
    let mut r = if msb >= 64 {
        sqrt_price_x64 >> (msb - 63)
    } else {
        sqrt_price_x64 << (63 - msb)
    };

    while bit > 0 && precision < BIT_PRECISION {
        r *= r;
        let is_r_more_than_two = r >> 127_u32;
        r >>= 63 + is_r_more_than_two;
        log2p_fraction_x64 += bit * is_r_more_than_two as i128;
        bit >>= 1;
        precision += 1;
    }

    let log2p_x32 = log2p_integer_x32 + (log2p_fraction_x64 >> 32);
    let logbp_x64 = log2p_x32 * LOG_B_2_X32;

    let tick_low = ((logbp_x64 - LOG_B_P_ERR_MARGIN_LOWER_X64) >> 64) as i32;
    let tick_high = ((logbp_x64 + LOG_B_P_ERR_MARGIN_UPPER_X64) >> 64) as i32;

    if tick_low == tick_high {
        return Ok(tick_low);
    }
    // The estimate brackets the answer; settle it with one exact evaluation
    if tick_high <= MAX_TICK && sqrt_price_at_tick(tick_high)? <= sqrt_price_x64 {
        Ok(tick_high)
    } else {
        Ok(tick_low)
    }
}

pub fn is_tick_valid(tick: i32) -> bool {
    (MIN_TICK..=MAX_TICK).contains(&tick)
}

pub fn is_sqrt_price_valid(sqrt_price_x64: u128) -> bool {
    (MIN_SQRT_PRICE_X64..=MAX_SQRT_PRICE_X64).contains(&sqrt_price_x64)
}

/// lower < upper, both in range, both aligned to the spacing
pub fn is_tick_range_valid(tick_lower: i32, tick_upper: i32, tick_spacing: i32) -> bool {
    tick_spacing > 0
        && tick_lower < tick_upper
        && is_tick_valid(tick_lower)
        && is_tick_valid(tick_upper)
        && tick_lower % tick_spacing == 0
        && tick_upper % tick_spacing == 0
}

/// Widest range aligned to `tick_spacing`
pub fn full_range_ticks(tick_spacing: i32) -> (i32, i32) {
    let upper = MAX_TICK - MAX_TICK % tick_spacing;
    (-upper, upper)
}

fn mul_shift_96(n0: u128, n1: u128) -> u128 {
    let product: U256 = (U256::from(n0) * U256::from(n1)) >> 96;
    product.as_u128()
}
