use alloy_primitives::U256;

/// 100% of an operator's slashable capacity for one strategy.
pub const WAD: u64 = 1_000_000_000_000_000_000;

/// `floor(value * wad / WAD)`.
pub fn mul_wad(value: u64, wad: u64) -> u64 {
    let product = value as u128 * wad as u128 / WAD as u128;
    u64::try_from(product).unwrap_or(u64::MAX)
}

/// Applies a signed diff to a magnitude, `None` when the result leaves the `u64` range.
pub fn add_signed(value: u64, diff: i128) -> Option<u64> {
    let result = (value as i128).checked_add(diff)?;
    u64::try_from(result).ok()
}

/// Signed difference `to - from` between two magnitudes.
pub fn signed_delta(from: u64, to: u64) -> i128 {
    to as i128 - from as i128
}

/// Shares backed by `magnitude` out of an operator's `max_magnitude`, rounded down.
pub fn proportional_stake(shares: U256, magnitude: u64, max_magnitude: u64) -> U256 {
    if max_magnitude == 0 {
        return U256::ZERO;
    }
    shares * U256::from(magnitude) / U256::from(max_magnitude)
}
