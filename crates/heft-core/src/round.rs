//! Size rounding.

/// Round a value to the given number of decimal places, half away from zero.
///
/// Pure and deterministic; negative inputs round sign-correctly without
/// clamping.
#[must_use]
pub fn round_to_precision(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision.try_into().unwrap_or(i32::MAX));
    (value * factor).round() / factor
}

/// Round a megabyte figure to the three decimal places used in every report.
#[must_use]
pub fn round_mb(value: f64) -> f64 {
    round_to_precision(value, 3)
}
