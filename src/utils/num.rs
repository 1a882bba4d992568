//! Numeric utilities for query arguments and bench lines.
//!
//! Pipeline and find arguments arrive as BSON numbers of any width; these helpers
//! turn them into sizes and offsets without panicking or silently wrapping.

use bson::Bson;

#[inline]
#[must_use]
pub fn usize_to_u64(v: usize) -> u64 {
    u64::try_from(v).unwrap_or(u64::MAX)
}

#[inline]
#[must_use]
pub fn u128_to_u64_saturating(v: u128) -> u64 {
    u64::try_from(v).unwrap_or(u64::MAX)
}

/// Elapsed wall time in whole milliseconds, saturating.
#[inline]
#[must_use]
pub fn elapsed_ms(start: std::time::Instant) -> u64 {
    u128_to_u64_saturating(start.elapsed().as_millis())
}

/// Non-negative integral BSON number as `usize`. Doubles must be integral.
#[must_use]
pub fn bson_to_usize(v: &Bson) -> Option<usize> {
    match v {
        Bson::Int32(i) => usize::try_from(*i).ok(),
        Bson::Int64(i) => usize::try_from(*i).ok(),
        Bson::Double(f) if f.is_finite() && f.fract() == 0.0 && *f >= 0.0 => {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let n = *f as u64;
            usize::try_from(n).ok()
        }
        _ => None,
    }
}

/// Any BSON number widened to `f64`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn bson_as_f64(v: &Bson) -> Option<f64> {
    match v {
        Bson::Int32(i) => Some(f64::from(*i)),
        Bson::Int64(i) => Some(*i as f64),
        Bson::Double(f) => Some(*f),
        Bson::Decimal128(d) => d.to_string().parse::<f64>().ok(),
        _ => None,
    }
}
