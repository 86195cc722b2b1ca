//! Calendar-driven demand factors.

/// Demand multiplier per calendar month, January first.
///
/// Winter demand runs higher than summer demand.
pub const SEASONAL_FACTORS: [f64; 12] = [1.2, 1.3, 1.1, 1.0, 0.9, 0.8, 0.8, 0.9, 1.0, 1.1, 1.2, 1.3];

/// First and last month (1-indexed, inclusive) of the holiday window.
///
/// The window wraps the year end: November through January.
pub const HOLIDAY_WINDOW: (u32, u32) = (11, 1);

/// Seasonal factor for a 1-indexed month; 1.0 for anything out of range.
#[must_use]
pub fn seasonal_factor(month: u32) -> f64 {
    month
        .checked_sub(1)
        .and_then(|index| SEASONAL_FACTORS.get(index as usize))
        .copied()
        .unwrap_or(1.0)
}

/// Whether a 1-indexed month falls inside [`HOLIDAY_WINDOW`].
#[must_use]
pub fn in_holiday_window(month: u32) -> bool {
    let (start, end) = HOLIDAY_WINDOW;
    if start <= end {
        (start..=end).contains(&month)
    } else {
        (1..=12).contains(&month) && (month >= start || month <= end)
    }
}
