//! Bullish continuation detectors: Bullish Flag, Cup and Handle
//!
//! Both work on closes only.

use std::collections::HashMap;

use super::helpers::{
    argmax, argmax_defined, argmin, argmin_defined, breaks_above, check_level, finite,
    BREAKOUT_MARGIN,
};
use crate::{
    indicators::{fit_linear_slope, rolling_mean},
    params::{get_level, get_period, get_ratio, get_scalar, ParamMeta, ParameterizedDetector},
    ChartDetector, Detection, Ohlc, PatternId, Period, Ratio, Result, Series,
};

impl_with_defaults!(BullishFlagDetector, CupAndHandleDetector);

/// Length of the flag; the pole is the same number of candles before it
pub const BF_WINDOW: usize = 20;
/// Minimum pole rise, first to last close
pub const BF_MIN_POLE_RISE: f64 = 0.05;
/// Maximum flag range / flag low
pub const BF_MAX_FLAG_RANGE: f64 = 0.03;
/// Maximum flag slope in price units per candle
pub const BF_MAX_FLAG_SLOPE: f64 = 0.001;
pub const BF_MAX_CONFIDENCE: f64 = 95.0;
const BF_CONFIDENCE_BASE: f64 = 80.0;
const BF_CONFIDENCE_SCALE: f64 = 10.0;
const BF_REFERENCE_RISE: f64 = 0.10;

pub const CH_WINDOW: usize = 50;
/// Rolling-mean length used to find the cup
pub const CH_SMOOTHING: usize = 5;
/// Maximum rim difference / higher rim
pub const CH_RIM_TOLERANCE: f64 = 0.05;
/// Each rim must stand this far above the bottom
pub const CH_MIN_DEPTH: f64 = 0.05;
/// Maximum handle range / handle low
pub const CH_MAX_HANDLE_RANGE: f64 = 0.03;
pub const CH_MIN_SIDE_POINTS: usize = 5;
pub const CH_MIN_HANDLE_LEN: usize = 5;
const CH_CONFIDENCE_BASE: f64 = 75.0;
const CH_CONFIDENCE_SCALE: f64 = 15.0;

// ============================================================
// BULLISH FLAG
// ============================================================

/// A sharp rise (the pole) followed by a tight, flat-to-falling consolidation.
///
/// Pole and flag are the `2 * window` closes before the last candle, which must
/// close above the flag high.
#[derive(Debug, Clone)]
pub struct BullishFlagDetector {
    pub window: Period,
    pub min_pole_rise: Ratio,
    pub max_flag_range: Ratio,
    pub max_flag_slope: f64,
    pub max_confidence: f64,
    pub breakout_margin: Ratio,
}

impl Default for BullishFlagDetector {
    fn default() -> Self {
        Self {
            window: Period::new_const(BF_WINDOW),
            min_pole_rise: Ratio::new_const(BF_MIN_POLE_RISE),
            max_flag_range: Ratio::new_const(BF_MAX_FLAG_RANGE),
            max_flag_slope: BF_MAX_FLAG_SLOPE,
            max_confidence: BF_MAX_CONFIDENCE,
            breakout_margin: Ratio::new_const(BREAKOUT_MARGIN),
        }
    }
}

impl ChartDetector for BullishFlagDetector {
    fn id(&self) -> PatternId {
        PatternId::BULLISH_FLAG
    }

    fn min_bars(&self) -> usize {
        self.window.get().saturating_mul(2).saturating_add(1)
    }

    fn detect<T: Ohlc>(&self, series: &Series<'_, T>) -> Result<Option<Detection>> {
        let window = self.window.get();
        let Some(last) = series.last_index() else {
            return Ok(None);
        };
        let Some(start) = window.checked_mul(2).and_then(|span| last.checked_sub(span)) else {
            return Ok(None);
        };

        let closes = series.closes();
        let pole = &closes[start..start + window];
        let flag = &closes[start + window..last];

        let (pole_start, pole_end) = (pole[0], pole[pole.len() - 1]);
        if pole_start <= 0.0 {
            return Ok(None);
        }
        let rise = (pole_end - pole_start) / pole_start;
        if rise < self.min_pole_rise.get() {
            return Ok(None);
        }

        let (Some((high_offset, flag_high)), Some((_, flag_low))) = (argmax(flag), argmin(flag)) else {
            return Ok(None);
        };
        if flag_low <= 0.0 || (flag_high - flag_low) / flag_low > self.max_flag_range.get() {
            return Ok(None);
        }

        // a one-candle flag has no slope to judge
        let slope = fit_linear_slope(flag).unwrap_or(0.0);
        if slope > self.max_flag_slope {
            tracing::trace!(slope, "bullish flag: flag drifting up");
            return Ok(None);
        }

        let raw = BF_CONFIDENCE_BASE + BF_CONFIDENCE_SCALE * (rise / BF_REFERENCE_RISE);
        let confidence = finite(raw.min(self.max_confidence), "bullish flag confidence")?;

        if !breaks_above(series.last_close(), flag_high, self.breakout_margin.get()) {
            return Ok(None);
        }

        let pole_end_idx = start + window - 1;
        Ok(Some(
            Detection::new(self.id(), confidence, flag_high)
                .point("Flagpole Start", series.timestamp(start), pole_start)
                .point("Flagpole End", series.timestamp(pole_end_idx), pole_end)
                .point("Flag High", series.timestamp(start + window + high_offset), flag_high),
        ))
    }

    fn validate_config(&self) -> Result<()> {
        check_level("max_confidence", self.max_confidence)
    }
}

// ============================================================
// CUP AND HANDLE
// ============================================================

/// Rounded bottom between two similar rims, then a narrow handle off the right rim.
///
/// The cup is read from a rolling mean of the trailing `window` closes, the
/// handle from the raw closes after the right rim.
#[derive(Debug, Clone)]
pub struct CupAndHandleDetector {
    pub window: Period,
    pub smoothing: Period,
    pub rim_tolerance: Ratio,
    pub min_depth: Ratio,
    pub max_handle_range: Ratio,
    pub min_side_points: Period,
    pub min_handle_len: Period,
    pub breakout_margin: Ratio,
}

impl Default for CupAndHandleDetector {
    fn default() -> Self {
        Self {
            window: Period::new_const(CH_WINDOW),
            smoothing: Period::new_const(CH_SMOOTHING),
            rim_tolerance: Ratio::new_const(CH_RIM_TOLERANCE),
            min_depth: Ratio::new_const(CH_MIN_DEPTH),
            max_handle_range: Ratio::new_const(CH_MAX_HANDLE_RANGE),
            min_side_points: Period::new_const(CH_MIN_SIDE_POINTS),
            min_handle_len: Period::new_const(CH_MIN_HANDLE_LEN),
            breakout_margin: Ratio::new_const(BREAKOUT_MARGIN),
        }
    }
}

impl ChartDetector for CupAndHandleDetector {
    fn id(&self) -> PatternId {
        PatternId::CUP_AND_HANDLE
    }

    fn min_bars(&self) -> usize {
        self.window.get()
    }

    fn detect<T: Ohlc>(&self, series: &Series<'_, T>) -> Result<Option<Detection>> {
        let Some(start) = series.tail_start(self.window.get()) else {
            return Ok(None);
        };
        let data = &series.closes()[start..];
        let smooth = rolling_mean(data, self.smoothing.get());

        let Some((bottom, cup_low)) = argmin_defined(&smooth) else {
            return Ok(None);
        };
        if cup_low <= 0.0 {
            return Ok(None);
        }

        // the bottom belongs to both sides; warm-up entries count toward the left
        let (left, right) = (&smooth[..=bottom], &smooth[bottom..]);
        let min_points = self.min_side_points.get();
        if left.len() < min_points || right.len() < min_points {
            return Ok(None);
        }

        let (Some((left_idx, left_rim)), Some((right_offset, right_rim))) =
            (argmax_defined(left), argmax_defined(right))
        else {
            return Ok(None);
        };
        let right_idx = bottom + right_offset;

        if (left_rim - right_rim).abs() / left_rim.max(right_rim) > self.rim_tolerance.get() {
            return Ok(None);
        }
        let depth = self.min_depth.get();
        if (left_rim - cup_low) / cup_low < depth || (right_rim - cup_low) / cup_low < depth {
            tracing::trace!(left_rim, right_rim, cup_low, "cup and handle: cup too shallow");
            return Ok(None);
        }

        let handle = &data[right_idx..];
        if handle.len() < self.min_handle_len.get() {
            return Ok(None);
        }
        let (Some((_, handle_high)), Some((_, handle_low))) = (argmax(handle), argmin(handle)) else {
            return Ok(None);
        };
        if handle_low <= 0.0 {
            return Ok(None);
        }
        let handle_range = (handle_high - handle_low) / handle_low;
        if handle_range > self.max_handle_range.get() {
            return Ok(None);
        }

        let confidence = finite(
            CH_CONFIDENCE_BASE + CH_CONFIDENCE_SCALE * (1.0 - handle_range),
            "cup and handle confidence",
        )?;

        let last_close = series.last_close();
        if !breaks_above(last_close, right_rim, self.breakout_margin.get()) {
            return Ok(None);
        }

        let last = series.len() - 1;
        Ok(Some(
            Detection::new(self.id(), confidence, right_rim)
                .point("Cup Left Max", series.timestamp(start + left_idx), left_rim)
                .point("Cup Bottom", series.timestamp(start + bottom), cup_low)
                .point("Cup Right Max", series.timestamp(start + right_idx), right_rim)
                .point("Handle End", series.timestamp(last), last_close),
        ))
    }
}

// ============================================================
// PARAMETERIZED DETECTOR IMPLEMENTATIONS
// ============================================================

static BULLISH_FLAG_PARAMS: &[ParamMeta] = &[
    ParamMeta::period("window", BF_WINDOW as f64, (10.0, 40.0, 5.0), "Flag length; the pole has the same length"),
    ParamMeta::ratio("min_pole_rise", BF_MIN_POLE_RISE, (0.03, 0.15, 0.01), "Minimum pole rise"),
    ParamMeta::ratio("max_flag_range", BF_MAX_FLAG_RANGE, (0.01, 0.06, 0.01), "Maximum flag range / flag low"),
    ParamMeta::scalar("max_flag_slope", BF_MAX_FLAG_SLOPE, (0.0, 0.01, 0.001), "Maximum flag slope per candle"),
    ParamMeta::level("max_confidence", BF_MAX_CONFIDENCE, (90.0, 100.0, 1.0), "Confidence cap"),
    ParamMeta::ratio("breakout_margin", BREAKOUT_MARGIN, (0.0, 0.02, 0.0025), "Close above the flag high by this fraction"),
];

static CUP_AND_HANDLE_PARAMS: &[ParamMeta] = &[
    ParamMeta::period("window", CH_WINDOW as f64, (30.0, 120.0, 10.0), "Trailing window in candles"),
    ParamMeta::period("smoothing", CH_SMOOTHING as f64, (3.0, 9.0, 2.0), "Rolling-mean length"),
    ParamMeta::ratio("rim_tolerance", CH_RIM_TOLERANCE, (0.01, 0.1, 0.01), "Maximum rim difference / higher rim"),
    ParamMeta::ratio("min_depth", CH_MIN_DEPTH, (0.03, 0.2, 0.01), "Minimum rim height above the bottom"),
    ParamMeta::ratio("max_handle_range", CH_MAX_HANDLE_RANGE, (0.01, 0.06, 0.01), "Maximum handle range / handle low"),
    ParamMeta::period("min_side_points", CH_MIN_SIDE_POINTS as f64, (3.0, 10.0, 1.0), "Smoothed entries required on each side, warm-up included"),
    ParamMeta::period("min_handle_len", CH_MIN_HANDLE_LEN as f64, (3.0, 15.0, 1.0), "Minimum handle length in candles"),
    ParamMeta::ratio("breakout_margin", BREAKOUT_MARGIN, (0.0, 0.02, 0.0025), "Close above the right rim by this fraction"),
];

impl ParameterizedDetector for BullishFlagDetector {
    fn param_meta() -> &'static [ParamMeta] {
        BULLISH_FLAG_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            window: get_period(params, "window", BF_WINDOW)?,
            min_pole_rise: get_ratio(params, "min_pole_rise", BF_MIN_POLE_RISE)?,
            max_flag_range: get_ratio(params, "max_flag_range", BF_MAX_FLAG_RANGE)?,
            max_flag_slope: get_scalar(params, "max_flag_slope", BF_MAX_FLAG_SLOPE)?,
            max_confidence: get_level(params, "max_confidence", BF_MAX_CONFIDENCE)?,
            breakout_margin: get_ratio(params, "breakout_margin", BREAKOUT_MARGIN)?,
        })
    }

    fn pattern_id_str() -> &'static str {
        PatternId::BULLISH_FLAG.as_str()
    }
}

impl ParameterizedDetector for CupAndHandleDetector {
    fn param_meta() -> &'static [ParamMeta] {
        CUP_AND_HANDLE_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            window: get_period(params, "window", CH_WINDOW)?,
            smoothing: get_period(params, "smoothing", CH_SMOOTHING)?,
            rim_tolerance: get_ratio(params, "rim_tolerance", CH_RIM_TOLERANCE)?,
            min_depth: get_ratio(params, "min_depth", CH_MIN_DEPTH)?,
            max_handle_range: get_ratio(params, "max_handle_range", CH_MAX_HANDLE_RANGE)?,
            min_side_points: get_period(params, "min_side_points", CH_MIN_SIDE_POINTS)?,
            min_handle_len: get_period(params, "min_handle_len", CH_MIN_HANDLE_LEN)?,
            breakout_margin: get_ratio(params, "breakout_margin", BREAKOUT_MARGIN)?,
        })
    }

    fn pattern_id_str() -> &'static str {
        PatternId::CUP_AND_HANDLE.as_str()
    }
}
