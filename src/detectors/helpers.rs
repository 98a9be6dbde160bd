//! Common thresholds and helper functions shared across all detector modules.

use crate::{PatternError, Result};

// ============================================================
// SHARED THRESHOLDS
// ============================================================

/// Minimum wall-clock distance between consecutive swing points (hours)
pub const MIN_SWING_GAP_HOURS: f64 = 6.0;
/// Last close must clear the entry level by this fraction (0.5%)
pub const BREAKOUT_MARGIN: f64 = 0.005;
/// RSI look-back used by the momentum filters
pub const RSI_PERIOD: usize = 14;

// ============================================================
// HELPER FUNCTIONS
// ============================================================

/// Round to 2 decimal places
#[inline]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Last close sits at least `margin` above `level`
#[inline]
pub fn breaks_above(last_close: f64, level: f64, margin: f64) -> bool {
    last_close >= level * (1.0 + margin)
}

/// Last close sits strictly more than `margin` above `level`
#[inline]
pub fn closes_beyond_above(last_close: f64, level: f64, margin: f64) -> bool {
    last_close > level * (1.0 + margin)
}

/// Last close sits strictly more than `margin` below `level`
#[inline]
pub fn closes_beyond_below(last_close: f64, level: f64, margin: f64) -> bool {
    last_close < level * (1.0 - margin)
}

/// The last `K` indices of an extrema list, oldest first
pub fn last_k<const K: usize>(indices: &[usize]) -> Option<[usize; K]> {
    let start = indices.len().checked_sub(K)?;
    <[usize; K]>::try_from(&indices[start..]).ok()
}

/// Position and value of the maximum; the first occurrence wins a tie
pub fn argmax(values: &[f64]) -> Option<(usize, f64)> {
    values.iter().copied().enumerate().fold(None, |best, (i, v)| match best {
        Some((_, b)) if b >= v => best,
        _ => Some((i, v)),
    })
}

/// Position and value of the minimum; the first occurrence wins a tie
pub fn argmin(values: &[f64]) -> Option<(usize, f64)> {
    values.iter().copied().enumerate().fold(None, |best, (i, v)| match best {
        Some((_, b)) if b <= v => best,
        _ => Some((i, v)),
    })
}

/// Position and value of the maximum among defined entries
pub fn argmax_defined(values: &[Option<f64>]) -> Option<(usize, f64)> {
    values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i, v)))
        .fold(None, |best, (i, v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
}

/// Position and value of the minimum among defined entries
pub fn argmin_defined(values: &[Option<f64>]) -> Option<(usize, f64)> {
    values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i, v)))
        .fold(None, |best, (i, v)| match best {
            Some((_, b)) if b <= v => best,
            _ => Some((i, v)),
        })
}

/// Guard a computed score: non-finite values are an internal fault, not a detection
#[inline]
pub fn finite(value: f64, what: &'static str) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(PatternError::Numerical(what))
    }
}

/// Reject negative or non-finite wall-clock gap thresholds
pub(crate) fn check_hours(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(PatternError::OutOfRange {
            field,
            value,
            min: 0.0,
            max: f64::MAX,
        })
    }
}

/// Reject levels outside the 0..=100 oscillator/score scale
pub(crate) fn check_level(field: &'static str, value: f64) -> Result<()> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(PatternError::OutOfRange {
            field,
            value,
            min: 0.0,
            max: 100.0,
        })
    }
}
