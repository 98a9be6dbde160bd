//! Swing-point reversal detectors: Head & Shoulders, Double Bottom, Triple Top
//!
//! All three read local extrema of a single price column and require the swing
//! points to sit at least [`MIN_SWING_GAP_HOURS`] apart in wall-clock time.

use std::collections::HashMap;

use super::helpers::{
    argmax, breaks_above, check_hours, check_level, finite, last_k, BREAKOUT_MARGIN,
    MIN_SWING_GAP_HOURS, RSI_PERIOD,
};
use crate::{
    indicators::{local_maxima, local_minima, relative_strength_index},
    params::{get_hours, get_level, get_period, get_ratio, ParamMeta, ParameterizedDetector},
    ChartDetector, Detection, Ohlc, PatternId, Period, Ratio, Result, Series,
};

impl_with_defaults!(HeadAndShouldersDetector, DoubleBottomDetector, TripleTopDetector);

/// Shoulders may differ by at most this fraction of the head price
pub const HS_SHOULDER_TOLERANCE: f64 = 0.15;
/// RSI at the last close must not exceed this level
pub const HS_MAX_RSI: f64 = 60.0;
/// Detections scoring below this are discarded
pub const HS_MIN_CONFIDENCE: f64 = 85.0;
const HS_CONFIDENCE_BASE: f64 = 80.0;
const HS_CONFIDENCE_SCALE: f64 = 10.0;

/// Troughs may differ by less than this fraction of the higher trough
pub const DB_TROUGH_TOLERANCE: f64 = 0.05;
/// RSI at the second trough must not exceed this level
pub const DB_MAX_RSI: f64 = 40.0;
pub const DB_MIN_CONFIDENCE: f64 = 80.0;
const DB_CONFIDENCE_BASE: f64 = 75.0;
const DB_CONFIDENCE_SCALE: f64 = 15.0;

/// Peak spread (max - min) may be at most this fraction of the highest peak
pub const TT_PEAK_TOLERANCE: f64 = 0.015;
const TT_CONFIDENCE_BASE: f64 = 75.0;
const TT_CONFIDENCE_SCALE: f64 = 10.0;

// ============================================================
// HEAD & SHOULDERS
// ============================================================

/// Three most recent close peaks: a head flanked by two similar shoulders.
///
/// Entry is the neckline (the lower shoulder). The pattern counts once the last
/// close trades above it with RSI not overbought.
#[derive(Debug, Clone)]
pub struct HeadAndShouldersDetector {
    pub min_gap_hours: f64,
    pub shoulder_tolerance: Ratio,
    pub rsi_period: Period,
    pub max_rsi: f64,
    pub min_confidence: f64,
    pub breakout_margin: Ratio,
}

impl Default for HeadAndShouldersDetector {
    fn default() -> Self {
        Self {
            min_gap_hours: MIN_SWING_GAP_HOURS,
            shoulder_tolerance: Ratio::new_const(HS_SHOULDER_TOLERANCE),
            rsi_period: Period::new_const(RSI_PERIOD),
            max_rsi: HS_MAX_RSI,
            min_confidence: HS_MIN_CONFIDENCE,
            breakout_margin: Ratio::new_const(BREAKOUT_MARGIN),
        }
    }
}

impl ChartDetector for HeadAndShouldersDetector {
    fn id(&self) -> PatternId {
        PatternId::HEAD_AND_SHOULDERS
    }

    fn min_bars(&self) -> usize {
        // three strict peaks need 7 candles; RSI must be defined at the last one
        self.rsi_period.get().max(7)
    }

    fn detect<T: Ohlc>(&self, series: &Series<'_, T>) -> Result<Option<Detection>> {
        let closes = series.closes();
        let peaks: Vec<usize> = local_maxima(closes).collect();
        let Some([ls, head, rs]) = last_k::<3>(&peaks) else {
            return Ok(None);
        };

        if series.elapsed_hours(ls, head) < self.min_gap_hours
            || series.elapsed_hours(head, rs) < self.min_gap_hours
        {
            return Ok(None);
        }

        let (left, head_price, right) = (closes[ls], closes[head], closes[rs]);
        if head_price <= 0.0 || head_price <= left || head_price <= right {
            return Ok(None);
        }

        let shoulder_gap = (left - right).abs() / head_price;
        if shoulder_gap >= self.shoulder_tolerance.get() {
            tracing::trace!(shoulder_gap, "head & shoulders: shoulders too uneven");
            return Ok(None);
        }

        let rsi = relative_strength_index(closes, self.rsi_period.get());
        let Some(last_rsi) = rsi.last().copied().flatten() else {
            return Ok(None);
        };
        if last_rsi > self.max_rsi {
            tracing::trace!(last_rsi, "head & shoulders: RSI filter");
            return Ok(None);
        }

        let confidence = finite(
            HS_CONFIDENCE_BASE + HS_CONFIDENCE_SCALE * (1.0 - shoulder_gap),
            "head & shoulders confidence",
        )?;
        if confidence < self.min_confidence {
            return Ok(None);
        }

        let (neck_idx, neckline) = if left <= right { (ls, left) } else { (rs, right) };
        if !breaks_above(series.last_close(), neckline, self.breakout_margin.get()) {
            return Ok(None);
        }

        Ok(Some(
            Detection::new(self.id(), confidence, neckline)
                .point("Left Shoulder", series.timestamp(ls), left)
                .point("Head", series.timestamp(head), head_price)
                .point("Right Shoulder", series.timestamp(rs), right)
                .point("Neckline", series.timestamp(neck_idx), neckline),
        ))
    }

    fn validate_config(&self) -> Result<()> {
        check_hours("min_gap_hours", self.min_gap_hours)?;
        check_level("max_rsi", self.max_rsi)?;
        check_level("min_confidence", self.min_confidence)
    }
}

// ============================================================
// DOUBLE BOTTOM
// ============================================================

/// Two most recent close troughs at about the same level with a peak between them.
///
/// The second trough must print on an oversold RSI; entry is the intervening peak.
#[derive(Debug, Clone)]
pub struct DoubleBottomDetector {
    pub min_gap_hours: f64,
    pub trough_tolerance: Ratio,
    pub rsi_period: Period,
    pub max_rsi: f64,
    pub min_confidence: f64,
    pub breakout_margin: Ratio,
}

impl Default for DoubleBottomDetector {
    fn default() -> Self {
        Self {
            min_gap_hours: MIN_SWING_GAP_HOURS,
            trough_tolerance: Ratio::new_const(DB_TROUGH_TOLERANCE),
            rsi_period: Period::new_const(RSI_PERIOD),
            max_rsi: DB_MAX_RSI,
            min_confidence: DB_MIN_CONFIDENCE,
            breakout_margin: Ratio::new_const(BREAKOUT_MARGIN),
        }
    }
}

impl ChartDetector for DoubleBottomDetector {
    fn id(&self) -> PatternId {
        PatternId::DOUBLE_BOTTOM
    }

    fn min_bars(&self) -> usize {
        // RSI defined at the second trough, plus the candle that makes it a trough
        self.rsi_period.get().saturating_add(1).max(5)
    }

    fn detect<T: Ohlc>(&self, series: &Series<'_, T>) -> Result<Option<Detection>> {
        let closes = series.closes();
        let troughs: Vec<usize> = local_minima(closes).collect();
        let Some([first, second]) = last_k::<2>(&troughs) else {
            return Ok(None);
        };

        if series.elapsed_hours(first, second) < self.min_gap_hours {
            return Ok(None);
        }

        let (low1, low2) = (closes[first], closes[second]);
        let reference = low1.max(low2);
        if reference <= 0.0 {
            return Ok(None);
        }

        let trough_gap = (low1 - low2).abs() / reference;
        if trough_gap >= self.trough_tolerance.get() {
            return Ok(None);
        }

        let Some((offset, peak)) = argmax(&closes[first..=second]) else {
            return Ok(None);
        };
        if peak <= low1 || peak <= low2 {
            return Ok(None);
        }

        let rsi = relative_strength_index(closes, self.rsi_period.get());
        let Some(trough_rsi) = rsi.get(second).copied().flatten() else {
            return Ok(None);
        };
        if trough_rsi > self.max_rsi {
            tracing::trace!(trough_rsi, "double bottom: second trough not oversold");
            return Ok(None);
        }

        let confidence = finite(
            DB_CONFIDENCE_BASE + DB_CONFIDENCE_SCALE * (1.0 - trough_gap),
            "double bottom confidence",
        )?;
        if confidence < self.min_confidence {
            return Ok(None);
        }

        let last_close = series.last_close();
        if !breaks_above(last_close, peak, self.breakout_margin.get()) {
            return Ok(None);
        }

        let last = closes.len() - 1;
        Ok(Some(
            Detection::new(self.id(), confidence, peak)
                .point("First Low", series.timestamp(first), low1)
                .point("Second Low", series.timestamp(second), low2)
                .point("Resistance", series.timestamp(first + offset), peak)
                .point("Entry", series.timestamp(last), last_close),
        ))
    }

    fn validate_config(&self) -> Result<()> {
        check_hours("min_gap_hours", self.min_gap_hours)?;
        check_level("max_rsi", self.max_rsi)?;
        check_level("min_confidence", self.min_confidence)
    }
}

// ============================================================
// TRIPLE TOP
// ============================================================

/// Three most recent peaks of the highs at nearly the same level.
///
/// Entry is the highest of the three; it needs a close above that resistance.
#[derive(Debug, Clone)]
pub struct TripleTopDetector {
    pub min_gap_hours: f64,
    pub peak_tolerance: Ratio,
    pub breakout_margin: Ratio,
}

impl Default for TripleTopDetector {
    fn default() -> Self {
        Self {
            min_gap_hours: MIN_SWING_GAP_HOURS,
            peak_tolerance: Ratio::new_const(TT_PEAK_TOLERANCE),
            breakout_margin: Ratio::new_const(BREAKOUT_MARGIN),
        }
    }
}

impl ChartDetector for TripleTopDetector {
    fn id(&self) -> PatternId {
        PatternId::TRIPLE_TOP
    }

    fn min_bars(&self) -> usize {
        7
    }

    fn detect<T: Ohlc>(&self, series: &Series<'_, T>) -> Result<Option<Detection>> {
        let highs = series.highs();
        let peaks: Vec<usize> = local_maxima(highs).collect();
        let Some([i1, i2, i3]) = last_k::<3>(&peaks) else {
            return Ok(None);
        };

        let (p1, p2, p3) = (highs[i1], highs[i2], highs[i3]);
        let top = p1.max(p2).max(p3);
        let bottom = p1.min(p2).min(p3);
        if top <= 0.0 || top - bottom > self.peak_tolerance.get() * top {
            return Ok(None);
        }

        if series.elapsed_hours(i1, i2) < self.min_gap_hours
            || series.elapsed_hours(i2, i3) < self.min_gap_hours
        {
            return Ok(None);
        }

        let confidence = finite(
            TT_CONFIDENCE_BASE + TT_CONFIDENCE_SCALE * (1.0 - (top - bottom) / top),
            "triple top confidence",
        )?;

        if !breaks_above(series.last_close(), top, self.breakout_margin.get()) {
            return Ok(None);
        }

        Ok(Some(
            Detection::new(self.id(), confidence, top)
                .point("Peak 1", series.timestamp(i1), p1)
                .point("Peak 2", series.timestamp(i2), p2)
                .point("Peak 3", series.timestamp(i3), p3),
        ))
    }

    fn validate_config(&self) -> Result<()> {
        check_hours("min_gap_hours", self.min_gap_hours)
    }
}

// ============================================================
// PARAMETERIZED DETECTOR IMPLEMENTATIONS
// ============================================================

static HEAD_AND_SHOULDERS_PARAMS: &[ParamMeta] = &[
    ParamMeta::hours("min_gap_hours", MIN_SWING_GAP_HOURS, (1.0, 24.0, 1.0), "Minimum hours between peaks"),
    ParamMeta::ratio("shoulder_tolerance", HS_SHOULDER_TOLERANCE, (0.05, 0.3, 0.05), "Maximum shoulder difference / head"),
    ParamMeta::period("rsi_period", RSI_PERIOD as f64, (7.0, 28.0, 7.0), "RSI look-back"),
    ParamMeta::level("max_rsi", HS_MAX_RSI, (50.0, 80.0, 5.0), "Maximum RSI at the last close"),
    ParamMeta::level("min_confidence", HS_MIN_CONFIDENCE, (80.0, 90.0, 1.0), "Confidence floor"),
    ParamMeta::ratio("breakout_margin", BREAKOUT_MARGIN, (0.0, 0.02, 0.0025), "Close above neckline by this fraction"),
];

static DOUBLE_BOTTOM_PARAMS: &[ParamMeta] = &[
    ParamMeta::hours("min_gap_hours", MIN_SWING_GAP_HOURS, (1.0, 24.0, 1.0), "Minimum hours between troughs"),
    ParamMeta::ratio("trough_tolerance", DB_TROUGH_TOLERANCE, (0.01, 0.1, 0.01), "Maximum trough difference / higher trough"),
    ParamMeta::period("rsi_period", RSI_PERIOD as f64, (7.0, 28.0, 7.0), "RSI look-back"),
    ParamMeta::level("max_rsi", DB_MAX_RSI, (20.0, 50.0, 5.0), "Maximum RSI at the second trough"),
    ParamMeta::level("min_confidence", DB_MIN_CONFIDENCE, (75.0, 90.0, 1.0), "Confidence floor"),
    ParamMeta::ratio("breakout_margin", BREAKOUT_MARGIN, (0.0, 0.02, 0.0025), "Close above the peak by this fraction"),
];

static TRIPLE_TOP_PARAMS: &[ParamMeta] = &[
    ParamMeta::hours("min_gap_hours", MIN_SWING_GAP_HOURS, (1.0, 24.0, 1.0), "Minimum hours between peaks"),
    ParamMeta::ratio("peak_tolerance", TT_PEAK_TOLERANCE, (0.005, 0.05, 0.005), "Maximum peak spread / highest peak"),
    ParamMeta::ratio("breakout_margin", BREAKOUT_MARGIN, (0.0, 0.02, 0.0025), "Close above resistance by this fraction"),
];

impl ParameterizedDetector for HeadAndShouldersDetector {
    fn param_meta() -> &'static [ParamMeta] {
        HEAD_AND_SHOULDERS_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            min_gap_hours: get_hours(params, "min_gap_hours", MIN_SWING_GAP_HOURS)?,
            shoulder_tolerance: get_ratio(params, "shoulder_tolerance", HS_SHOULDER_TOLERANCE)?,
            rsi_period: get_period(params, "rsi_period", RSI_PERIOD)?,
            max_rsi: get_level(params, "max_rsi", HS_MAX_RSI)?,
            min_confidence: get_level(params, "min_confidence", HS_MIN_CONFIDENCE)?,
            breakout_margin: get_ratio(params, "breakout_margin", BREAKOUT_MARGIN)?,
        })
    }

    fn pattern_id_str() -> &'static str {
        PatternId::HEAD_AND_SHOULDERS.as_str()
    }
}

impl ParameterizedDetector for DoubleBottomDetector {
    fn param_meta() -> &'static [ParamMeta] {
        DOUBLE_BOTTOM_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            min_gap_hours: get_hours(params, "min_gap_hours", MIN_SWING_GAP_HOURS)?,
            trough_tolerance: get_ratio(params, "trough_tolerance", DB_TROUGH_TOLERANCE)?,
            rsi_period: get_period(params, "rsi_period", RSI_PERIOD)?,
            max_rsi: get_level(params, "max_rsi", DB_MAX_RSI)?,
            min_confidence: get_level(params, "min_confidence", DB_MIN_CONFIDENCE)?,
            breakout_margin: get_ratio(params, "breakout_margin", BREAKOUT_MARGIN)?,
        })
    }

    fn pattern_id_str() -> &'static str {
        PatternId::DOUBLE_BOTTOM.as_str()
    }
}

impl ParameterizedDetector for TripleTopDetector {
    fn param_meta() -> &'static [ParamMeta] {
        TRIPLE_TOP_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            min_gap_hours: get_hours(params, "min_gap_hours", MIN_SWING_GAP_HOURS)?,
            peak_tolerance: get_ratio(params, "peak_tolerance", TT_PEAK_TOLERANCE)?,
            breakout_margin: get_ratio(params, "breakout_margin", BREAKOUT_MARGIN)?,
        })
    }

    fn pattern_id_str() -> &'static str {
        PatternId::TRIPLE_TOP.as_str()
    }
}
