//! Fixed-point and accounting helpers shared by the vault manager and the
//! redemption buffer.
//!
//! - Collateralization limits are 1e18-scaled ratios (2e18 = 200%)
//! - Fees are expressed in basis points of `PERCENT_RESOLUTION`
//! - The dividend accumulator is scaled by `POINT_MULTIPLIER`
//!
//! Collateral and debt asset may use different decimals; the
//! `decimal_scale` (10^(debt_decimals - collateral_decimals)) converts one
//! collateral unit into debt units.

use odra::casper_types::U256;

/// Internal precision scale (1e18)
pub const PRECISION: u64 = 1_000_000_000_000_000_000;

/// Basis points scale (100% = 10000 bps)
pub const PERCENT_RESOLUTION: u64 = 10_000;

/// Lowest accepted collateralization limit (100%)
pub const MINIMUM_COLLATERALIZATION_LIMIT: u64 = 1_000_000_000_000_000_000;

/// Highest accepted collateralization limit (400%)
pub const MAXIMUM_COLLATERALIZATION_LIMIT: u64 = 4_000_000_000_000_000_000;

/// Scale of the per-share dividend accumulator (1e19)
pub const POINT_MULTIPLIER: u64 = 10_000_000_000_000_000_000;

/// Default unlock period of the redemption buffer (1 hour, in ms)
pub const DEFAULT_TRANSMUTATION_PERIOD: u64 = 3_600_000;

/// Default plantable margin, in percent of the threshold
pub const DEFAULT_PLANTABLE_MARGIN: u64 = 5;

/// Largest accepted plantable margin, in percent of the threshold
pub const MAXIMUM_PLANTABLE_MARGIN: u64 = 100;

/// Conversion factor from collateral units to debt units.
///
/// Returns `None` when the collateral has more decimals than the debt asset.
pub fn decimal_scale(collateral_decimals: u8, debt_decimals: u8) -> Option<U256> {
    if collateral_decimals > debt_decimals {
        return None;
    }
    let exponent = debt_decimals - collateral_decimals;
    Some(U256::from(10u64).pow(U256::from(exponent)))
}

/// Largest debt a deposit can carry: `deposited * scale * PRECISION / limit`
pub fn maximum_debt(deposited: U256, limit: U256, scale: U256) -> U256 {
    if limit.is_zero() {
        return U256::zero();
    }
    deposited * scale * U256::from(PRECISION) / limit
}

/// Collateral that must stay deposited to back `debt`.
///
/// Rounds up so that withdrawing the complement never leaves the position
/// below the limit.
pub fn required_collateral(debt: U256, limit: U256, scale: U256) -> U256 {
    if debt.is_zero() {
        return U256::zero();
    }
    let denominator = U256::from(PRECISION) * scale;
    let numerator = debt * limit;
    let quotient = numerator / denominator;
    if (numerator % denominator).is_zero() {
        quotient
    } else {
        quotient + U256::one()
    }
}

/// Collateral the owner may take out: `deposited - debt * limit / PRECISION`
pub fn withdrawable(deposited: U256, debt: U256, limit: U256, scale: U256) -> U256 {
    deposited.saturating_sub(required_collateral(debt, limit, scale))
}

/// Whether `debt` is within the collateralization limit for `deposited`
pub fn is_healthy(deposited: U256, debt: U256, limit: U256, scale: U256) -> bool {
    debt.is_zero() || maximum_debt(deposited, limit, scale) >= debt
}

/// Portion of `amount` taken as fee at `fee_bps`
pub fn percent_of(amount: U256, fee_bps: u64) -> U256 {
    amount * U256::from(fee_bps) / U256::from(PERCENT_RESOLUTION)
}

/// Linear unlock: the whole buffer once `elapsed >= period`, otherwise
/// `buffer * elapsed / period`.
pub fn unlocked_amount(buffer: U256, elapsed: u64, period: u64) -> U256 {
    if elapsed >= period {
        return buffer;
    }
    buffer * U256::from(elapsed) / U256::from(period)
}

/// Accumulator increase for spreading `amount` over `total_staked`
pub fn points_for(amount: U256, total_staked: U256) -> U256 {
    if total_staked.is_zero() {
        return U256::zero();
    }
    amount * U256::from(POINT_MULTIPLIER) / total_staked
}

/// Share of the accumulator growth owed to a stake of `deposited`
pub fn dividends_owing(deposited: U256, points_delta: U256) -> U256 {
    deposited * points_delta / U256::from(POINT_MULTIPLIER)
}

/// Hysteresis band `(low, high)` around the plantable threshold.
///
/// `margin_percent` is a percentage of the threshold.
pub fn plantable_band(threshold: U256, margin_percent: U256) -> (U256, U256) {
    let margin = threshold * margin_percent / U256::from(100u64);
    (threshold.saturating_sub(margin), threshold + margin)
}
