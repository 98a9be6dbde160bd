//! Read-only view over an OHLC series
//!
//! Detectors never touch the caller's candles directly: they read the cached price
//! columns and timestamps through [`Series`], which borrows the candles for the
//! duration of one detection pass.

use chrono::{DateTime, Utc};

use crate::{Ohlc, OhlcExt, PatternError, Result};

/// Borrowed OHLC series, time ascending
#[derive(Debug, Clone)]
pub struct Series<'a, T> {
    bars: &'a [T],
    closes: Vec<f64>,
    highs: Vec<f64>,
    lows: Vec<f64>,
}

impl<'a, T: Ohlc> Series<'a, T> {
    /// Wrap candles without checking the input contract
    pub fn new(bars: &'a [T]) -> Self {
        Self {
            bars,
            closes: bars.iter().map(Ohlc::close).collect(),
            highs: bars.iter().map(Ohlc::high).collect(),
            lows: bars.iter().map(Ohlc::low).collect(),
        }
    }

    /// Wrap candles after checking each one and the timestamp ordering
    pub fn validated(bars: &'a [T]) -> Result<Self> {
        for (i, bar) in bars.iter().enumerate() {
            bar.validate().map_err(|e| match e {
                PatternError::InvalidOhlc { reason, .. } => PatternError::InvalidOhlc { index: i, reason },
                other => other,
            })?;
        }
        for (i, pair) in bars.windows(2).enumerate() {
            if pair[1].timestamp() <= pair[0].timestamp() {
                return Err(PatternError::UnorderedTimestamps { index: i + 1 });
            }
        }
        Ok(Self::new(bars))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    #[inline]
    pub fn closes(&self) -> &[f64] {
        &self.closes
    }

    #[inline]
    pub fn highs(&self) -> &[f64] {
        &self.highs
    }

    #[inline]
    pub fn lows(&self) -> &[f64] {
        &self.lows
    }

    /// Timestamp of the candle at `index`. Panics when out of bounds, like slice indexing.
    #[inline]
    pub fn timestamp(&self, index: usize) -> DateTime<Utc> {
        self.bars[index].timestamp()
    }

    /// Close of the most recent candle; NaN on an empty series
    #[inline]
    pub fn last_close(&self) -> f64 {
        self.closes.last().copied().unwrap_or(f64::NAN)
    }

    /// Index of the last candle, if any
    #[inline]
    pub fn last_index(&self) -> Option<usize> {
        self.len().checked_sub(1)
    }

    /// Start index of the trailing window of `n` candles, if the series holds that many
    #[inline]
    pub fn tail_start(&self, n: usize) -> Option<usize> {
        self.len().checked_sub(n)
    }

    /// Wall-clock hours from candle `from` to candle `to` (negative if `to` is earlier)
    pub fn elapsed_hours(&self, from: usize, to: usize) -> f64 {
        let delta = self.timestamp(to) - self.timestamp(from);
        delta.num_milliseconds() as f64 / 3_600_000.0
    }
}
