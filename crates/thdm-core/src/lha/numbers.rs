//! Fortran real literals as the tools read and write them.
//!
//! SusHi decks want `d`-exponent literals ("125.d0"), CalcHybrid wants plain
//! decimal arguments, and both tools emit `E`-notation in their output. The
//! helpers here pin those spellings down so rendered inputs are byte-stable
//! across runs.

use super::LhaError;

/// Parses a real number, accepting the Fortran `D`/`d` exponent marker.
pub fn parse_real(token: &str) -> Result<f64, LhaError> {
    let normalized = token.trim().replace(['D', 'd'], "E");
    normalized
        .parse::<f64>()
        .map_err(|_| LhaError::Number {
            token: token.trim().to_string(),
        })
}

/// Formats a value as a Fortran double literal with a `d0` exponent,
/// trailing fractional zeros trimmed: `125.0` becomes `"125.d0"`,
/// `0.1` becomes `"0.1d0"`.
pub fn format_real(value: f64) -> String {
    let repr = format_decimal(value);
    if repr.contains('.') {
        format!("{}d0", repr.trim_end_matches('0'))
    } else {
        format!("{repr}.d0")
    }
}

/// Formats a value in plain decimal, keeping one fractional digit for whole
/// numbers so `125.0` stays `"125.0"` rather than collapsing to `"125"`.
pub fn format_decimal(value: f64) -> String {
    if value.is_finite() && value == value.trunc() && value.abs() < 1.0e16 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}
