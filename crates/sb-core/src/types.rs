//! Common numeric helpers used throughout Sitebook RS

/// Quantities are tracked in the item's declared unit and may be fractional
pub type Quantity = f64;

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `part / total * 100`, rounded to two decimals
///
/// A zero (or non-finite) total yields `0.0` rather than NaN/Infinity.
pub fn percent_of(part: Quantity, total: Quantity) -> f64 {
    if total == 0.0 || !total.is_finite() || !part.is_finite() {
        return 0.0;
    }
    round2(part / total * 100.0)
}

/// Clamp a percentage into `0..=100` for display
pub fn display_percent(percent: f64) -> f64 {
    percent.clamp(0.0, 100.0)
}
