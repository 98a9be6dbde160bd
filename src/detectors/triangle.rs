//! Converging trendline detectors: Ascending Triangle, Symmetrical Triangle, Rising Wedge
//!
//! Trendlines are least-squares fits of the highs and lows over a fixed trailing
//! window. The triangles measure the formation on the candles before the last one
//! and use the last candle as the breakout confirmation; the wedge keeps the last
//! candle inside its window because its test is a close back near support.

use std::collections::HashMap;

use super::helpers::{
    argmax, argmin, breaks_above, check_level, closes_beyond_above, closes_beyond_below, finite,
    BREAKOUT_MARGIN,
};
use crate::{
    indicators::{fit_linear_slope, macd_histogram, sample_std, MACD_MIN_BARS},
    params::{get_level, get_period, get_ratio, ParamMeta, ParameterizedDetector},
    ChartDetector, Detection, Direction, Ohlc, PatternId, Period, Ratio, Result, Series,
};

impl_with_defaults!(
    AscendingTriangleDetector,
    SymmetricalTriangleDetector,
    RisingWedgeDetector,
);

/// Formation length for the ascending triangle
pub const AT_WINDOW: usize = 20;
/// Maximum std(highs) / resistance for a flat top
pub const AT_FLATNESS_TOLERANCE: f64 = 0.01;
pub const AT_MIN_CONFIDENCE: f64 = 80.0;
const AT_CONFIDENCE_BASE: f64 = 70.0;
const AT_CONFIDENCE_SCALE: f64 = 20.0;

/// Formation length for the symmetrical triangle
pub const ST_WINDOW: usize = 30;
/// Trailing window for the rising wedge, last candle included
pub const RW_WINDOW: usize = 30;
const CONVERGENCE_CONFIDENCE_BASE: f64 = 75.0;
const CONVERGENCE_CONFIDENCE_SCALE: f64 = 15.0;

/// Spread between the trendlines at both ends of a window
struct Convergence {
    start: usize,
    end: usize,
    high_slope: f64,
    low_slope: f64,
    spread_start: f64,
    spread_end: f64,
}

impl Convergence {
    /// Fit both trendlines over `start..end`. `None` for fewer than two candles.
    fn fit<T: Ohlc>(series: &Series<'_, T>, start: usize, end: usize) -> Option<Self> {
        let highs = &series.highs()[start..end];
        let lows = &series.lows()[start..end];
        let high_slope = fit_linear_slope(highs)?;
        let low_slope = fit_linear_slope(lows)?;
        Some(Self {
            start,
            end: end - 1,
            high_slope,
            low_slope,
            spread_start: highs[0] - lows[0],
            spread_end: highs[highs.len() - 1] - lows[lows.len() - 1],
        })
    }

    /// Spread shrinks from a positive start
    fn narrows(&self) -> bool {
        self.spread_start > 0.0 && self.spread_end < self.spread_start
    }

    fn confidence(&self) -> f64 {
        CONVERGENCE_CONFIDENCE_BASE
            + CONVERGENCE_CONFIDENCE_SCALE * (self.spread_start - self.spread_end) / self.spread_start
    }

    fn key_points<T: Ohlc>(&self, detection: Detection, series: &Series<'_, T>) -> Detection {
        let (highs, lows) = (series.highs(), series.lows());
        detection
            .point("High Start", series.timestamp(self.start), highs[self.start])
            .point("High End", series.timestamp(self.end), highs[self.end])
            .point("Low Start", series.timestamp(self.start), lows[self.start])
            .point("Low End", series.timestamp(self.end), lows[self.end])
    }
}

// ============================================================
// ASCENDING TRIANGLE
// ============================================================

/// Flat resistance over rising support, confirmed by a non-negative MACD histogram.
#[derive(Debug, Clone)]
pub struct AscendingTriangleDetector {
    pub window: Period,
    pub flatness_tolerance: Ratio,
    pub min_confidence: f64,
    pub breakout_margin: Ratio,
}

impl Default for AscendingTriangleDetector {
    fn default() -> Self {
        Self {
            window: Period::new_const(AT_WINDOW),
            flatness_tolerance: Ratio::new_const(AT_FLATNESS_TOLERANCE),
            min_confidence: AT_MIN_CONFIDENCE,
            breakout_margin: Ratio::new_const(BREAKOUT_MARGIN),
        }
    }
}

impl ChartDetector for AscendingTriangleDetector {
    fn id(&self) -> PatternId {
        PatternId::ASCENDING_TRIANGLE
    }

    fn min_bars(&self) -> usize {
        self.window.get().saturating_add(1).max(MACD_MIN_BARS)
    }

    fn detect<T: Ohlc>(&self, series: &Series<'_, T>) -> Result<Option<Detection>> {
        let window = self.window.get();
        let Some(last) = series.last_index() else {
            return Ok(None);
        };
        let Some(start) = last.checked_sub(window) else {
            return Ok(None);
        };

        let highs = &series.highs()[start..last];
        let lows = &series.lows()[start..last];

        let Some((offset, resistance)) = argmax(highs) else {
            return Ok(None);
        };
        let (Some(std), Some(support_slope)) = (sample_std(highs), fit_linear_slope(lows)) else {
            return Ok(None);
        };
        if resistance <= 0.0 {
            return Ok(None);
        }

        let Some(hist) = macd_histogram(series.closes()).last().copied().flatten() else {
            return Ok(None);
        };
        if hist < 0.0 {
            tracing::trace!(hist, "ascending triangle: negative MACD histogram");
            return Ok(None);
        }

        let flatness = std / resistance;
        if !(flatness < self.flatness_tolerance.get() && support_slope > 0.0) {
            return Ok(None);
        }

        let confidence = finite(
            AT_CONFIDENCE_BASE + AT_CONFIDENCE_SCALE * (1.0 - flatness),
            "ascending triangle confidence",
        )?;
        if confidence < self.min_confidence {
            return Ok(None);
        }

        let last_close = series.last_close();
        if !breaks_above(last_close, resistance, self.breakout_margin.get()) {
            return Ok(None);
        }

        Ok(Some(
            Detection::new(self.id(), confidence, resistance)
                .point("Resistance", series.timestamp(start + offset), resistance)
                .point("Support Start", series.timestamp(start), lows[0])
                .point("Support End", series.timestamp(last - 1), lows[lows.len() - 1])
                .point("Entry", series.timestamp(last), last_close),
        ))
    }

    fn validate_config(&self) -> Result<()> {
        check_level("min_confidence", self.min_confidence)
    }
}

// ============================================================
// SYMMETRICAL TRIANGLE
// ============================================================

/// Falling highs over rising lows; the breakout side sets the direction.
#[derive(Debug, Clone)]
pub struct SymmetricalTriangleDetector {
    pub window: Period,
    pub breakout_margin: Ratio,
}

impl Default for SymmetricalTriangleDetector {
    fn default() -> Self {
        Self {
            window: Period::new_const(ST_WINDOW),
            breakout_margin: Ratio::new_const(BREAKOUT_MARGIN),
        }
    }
}

impl ChartDetector for SymmetricalTriangleDetector {
    fn id(&self) -> PatternId {
        PatternId::SYMMETRICAL_TRIANGLE
    }

    fn min_bars(&self) -> usize {
        self.window.get().saturating_add(1)
    }

    fn detect<T: Ohlc>(&self, series: &Series<'_, T>) -> Result<Option<Detection>> {
        let Some(last) = series.last_index() else {
            return Ok(None);
        };
        let Some(start) = last.checked_sub(self.window.get()) else {
            return Ok(None);
        };
        let Some(fit) = Convergence::fit(series, start, last) else {
            return Ok(None);
        };

        if !(fit.high_slope < 0.0 && fit.low_slope > 0.0) || !fit.narrows() {
            return Ok(None);
        }

        let confidence = finite(fit.confidence(), "symmetrical triangle confidence")?;

        let margin = self.breakout_margin.get();
        let last_close = series.last_close();
        let upper = argmax(&series.highs()[start..last]).map(|(_, v)| v);
        let lower = argmin(&series.lows()[start..last]).map(|(_, v)| v);
        let (entry, direction) = match (upper, lower) {
            (Some(high), _) if closes_beyond_above(last_close, high, margin) => (high, Direction::Bullish),
            (_, Some(low)) if closes_beyond_below(last_close, low, margin) => (low, Direction::Bearish),
            _ => return Ok(None),
        };

        let detection = Detection::new(self.id(), confidence, entry).with_breakout(direction);
        Ok(Some(fit.key_points(detection, series)))
    }
}

// ============================================================
// RISING WEDGE
// ============================================================

/// Both trendlines rising while they converge; present while the last close
/// sits at or below the window's lowest low (plus margin).
#[derive(Debug, Clone)]
pub struct RisingWedgeDetector {
    pub window: Period,
    pub breakout_margin: Ratio,
}

impl Default for RisingWedgeDetector {
    fn default() -> Self {
        Self {
            window: Period::new_const(RW_WINDOW),
            breakout_margin: Ratio::new_const(BREAKOUT_MARGIN),
        }
    }
}

impl ChartDetector for RisingWedgeDetector {
    fn id(&self) -> PatternId {
        PatternId::RISING_WEDGE
    }

    fn min_bars(&self) -> usize {
        self.window.get().max(2)
    }

    fn detect<T: Ohlc>(&self, series: &Series<'_, T>) -> Result<Option<Detection>> {
        let Some(start) = series.tail_start(self.window.get()) else {
            return Ok(None);
        };
        let Some(fit) = Convergence::fit(series, start, series.len()) else {
            return Ok(None);
        };

        if !(fit.high_slope > 0.0 && fit.low_slope > 0.0) || !fit.narrows() {
            return Ok(None);
        }

        let Some((_, support)) = argmin(&series.lows()[start..]) else {
            return Ok(None);
        };
        // not reclaimed: the close has not lifted clear of support
        if series.last_close() > support * (1.0 + self.breakout_margin.get()) {
            return Ok(None);
        }

        let confidence = finite(fit.confidence(), "rising wedge confidence")?;
        let detection = Detection::new(self.id(), confidence, support);
        Ok(Some(fit.key_points(detection, series)))
    }
}

// ============================================================
// PARAMETERIZED DETECTOR IMPLEMENTATIONS
// ============================================================

static ASCENDING_TRIANGLE_PARAMS: &[ParamMeta] = &[
    ParamMeta::period("window", AT_WINDOW as f64, (10.0, 40.0, 5.0), "Formation length in candles"),
    ParamMeta::ratio("flatness_tolerance", AT_FLATNESS_TOLERANCE, (0.005, 0.03, 0.005), "Maximum std(highs) / resistance"),
    ParamMeta::level("min_confidence", AT_MIN_CONFIDENCE, (75.0, 90.0, 1.0), "Confidence floor"),
    ParamMeta::ratio("breakout_margin", BREAKOUT_MARGIN, (0.0, 0.02, 0.0025), "Close above resistance by this fraction"),
];

static SYMMETRICAL_TRIANGLE_PARAMS: &[ParamMeta] = &[
    ParamMeta::period("window", ST_WINDOW as f64, (15.0, 60.0, 5.0), "Formation length in candles"),
    ParamMeta::ratio("breakout_margin", BREAKOUT_MARGIN, (0.0, 0.02, 0.0025), "Close beyond the range by this fraction"),
];

static RISING_WEDGE_PARAMS: &[ParamMeta] = &[
    ParamMeta::period("window", RW_WINDOW as f64, (15.0, 60.0, 5.0), "Trailing window in candles"),
    ParamMeta::ratio("breakout_margin", BREAKOUT_MARGIN, (0.0, 0.02, 0.0025), "Close may sit this far above support"),
];

impl ParameterizedDetector for AscendingTriangleDetector {
    fn param_meta() -> &'static [ParamMeta] {
        ASCENDING_TRIANGLE_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            window: get_period(params, "window", AT_WINDOW)?,
            flatness_tolerance: get_ratio(params, "flatness_tolerance", AT_FLATNESS_TOLERANCE)?,
            min_confidence: get_level(params, "min_confidence", AT_MIN_CONFIDENCE)?,
            breakout_margin: get_ratio(params, "breakout_margin", BREAKOUT_MARGIN)?,
        })
    }

    fn pattern_id_str() -> &'static str {
        PatternId::ASCENDING_TRIANGLE.as_str()
    }
}

impl ParameterizedDetector for SymmetricalTriangleDetector {
    fn param_meta() -> &'static [ParamMeta] {
        SYMMETRICAL_TRIANGLE_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            window: get_period(params, "window", ST_WINDOW)?,
            breakout_margin: get_ratio(params, "breakout_margin", BREAKOUT_MARGIN)?,
        })
    }

    fn pattern_id_str() -> &'static str {
        PatternId::SYMMETRICAL_TRIANGLE.as_str()
    }
}

impl ParameterizedDetector for RisingWedgeDetector {
    fn param_meta() -> &'static [ParamMeta] {
        RISING_WEDGE_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            window: get_period(params, "window", RW_WINDOW)?,
            breakout_margin: get_ratio(params, "breakout_margin", BREAKOUT_MARGIN)?,
        })
    }

    fn pattern_id_str() -> &'static str {
        PatternId::RISING_WEDGE.as_str()
    }
}
