//! # chartform - chart pattern recognition
//!
//! Recognizes classical chart formations (head & shoulders, double bottom, triangles,
//! wedges, flags, cup and handle) over a recent window of OHLC candles and reports the
//! strongest one with a confidence score, an entry price and annotated key points.
//!
//! ## Quick Start
//!
//! ```rust
//! use chartform::prelude::*;
//! use chrono::{TimeZone, Utc};
//!
//! let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//! let candles: Vec<Candle> = (0..60)
//!     .map(|i| {
//!         let ts = start + chrono::Duration::hours(i);
//!         Candle::new(ts, 100.0, 101.0, 99.0, 100.0)
//!     })
//!     .collect();
//!
//! let engine = EngineBuilder::new().with_all_defaults().build().unwrap();
//!
//! // A flat market forms no pattern
//! assert!(engine.detect(&candles).unwrap().is_none());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod detectors;
pub mod indicators;
pub mod params;
pub mod series;

pub use series::Series;

pub mod prelude {
    pub use crate::{
        // Detectors
        detectors::*,
        // Parameters
        params::{
            get_hours, get_level, get_period, get_ratio, get_scalar, ParamMeta, ParamType,
            ParameterizedDetector,
        },
        // Parallel
        scan_parallel,
        // Selection
        detect_patterns,
        select_best,
        // Engine
        BuiltinDetector,
        // Types
        Candle,
        // Core traits
        ChartDetector,
        Detection,
        Direction,
        DynChartDetector,
        EngineBuilder,
        EngineConfig,
        KeyPoint,
        Ohlc,
        OhlcExt,
        PatternEngine,
        // Errors
        PatternError,
        PatternId,
        Period,
        Ratio,
        Result,
        ScanError,
        ScanResult,
        Series,
        TradeLevels,
    };
}

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, PatternError>;

/// Errors that can occur while configuring the engine or evaluating a series
#[derive(Debug, Clone, thiserror::Error)]
pub enum PatternError {
    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid OHLC at index {index}: {reason}")]
    InvalidOhlc { index: usize, reason: &'static str },

    #[error("Timestamp at index {index} is not after its predecessor")]
    UnorderedTimestamps { index: usize },

    #[error("Numerical fault: {0}")]
    Numerical(&'static str),
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Normalized value in range 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Ratio(f64);

impl Ratio {
    /// Create a new Ratio, validating the value is in [0.0, 1.0]
    pub fn new(value: f64) -> Result<Self> {
        if value.is_nan() || value.is_infinite() {
            return Err(PatternError::InvalidValue(
                "Ratio cannot be NaN or infinite",
            ));
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(PatternError::OutOfRange {
                field: "Ratio",
                value,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(Self(value))
    }

    /// Create a Ratio from a compile-time constant (library internal use)
    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl Serialize for Ratio {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> Deserialize<'de> for Ratio {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        Ratio::new(value).map_err(serde::de::Error::custom)
    }
}

/// Period (must be > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period(usize);

impl Period {
    /// Create a new Period, validating value is > 0
    pub fn new(value: usize) -> Result<Self> {
        if value == 0 {
            return Err(PatternError::InvalidValue("Period must be > 0"));
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = usize::deserialize(d)?;
        Period::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// OHLC TRAITS
// ============================================================

/// Core OHLC candle trait
///
/// Volume is deliberately absent: no detector reads it.
pub trait Ohlc {
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;
    fn timestamp(&self) -> DateTime<Utc>;
}

/// Blanket impl for references to dyn Ohlc
impl Ohlc for &dyn Ohlc {
    fn open(&self) -> f64 {
        (*self).open()
    }

    fn high(&self) -> f64 {
        (*self).high()
    }

    fn low(&self) -> f64 {
        (*self).low()
    }

    fn close(&self) -> f64 {
        (*self).close()
    }

    fn timestamp(&self) -> DateTime<Utc> {
        (*self).timestamp()
    }
}

/// Extension trait with computed properties for OHLC data
pub trait OhlcExt: Ohlc {
    /// Validate a single candle: finite, strictly positive prices with high >= low
    fn validate(&self) -> Result<()> {
        let prices = [self.open(), self.high(), self.low(), self.close()];
        if prices.iter().any(|p| p.is_nan()) {
            return Err(PatternError::InvalidOhlc {
                index: 0,
                reason: "NaN in OHLC",
            });
        }
        if prices.iter().any(|p| p.is_infinite()) {
            return Err(PatternError::InvalidOhlc {
                index: 0,
                reason: "Infinite value in OHLC",
            });
        }
        if prices.iter().any(|p| *p <= 0.0) {
            return Err(PatternError::InvalidOhlc {
                index: 0,
                reason: "non-positive price",
            });
        }
        if self.high() < self.low() {
            return Err(PatternError::InvalidOhlc {
                index: 0,
                reason: "high < low",
            });
        }
        Ok(())
    }
}

impl<T: Ohlc> OhlcExt for T {}

/// Plain candle as delivered by a market-data source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    pub fn new(timestamp: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
        }
    }
}

impl Ohlc for Candle {
    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

// ============================================================
// DETECTION - result of a detector
// ============================================================

/// Unique identifier of a chart pattern; the string is the display label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PatternId(pub &'static str);

impl PatternId {
    pub const HEAD_AND_SHOULDERS: PatternId = PatternId("Head & Shoulders");
    pub const DOUBLE_BOTTOM: PatternId = PatternId("Double Bottom");
    pub const ASCENDING_TRIANGLE: PatternId = PatternId("Ascending Triangle");
    pub const TRIPLE_TOP: PatternId = PatternId("Triple Top");
    pub const BULLISH_FLAG: PatternId = PatternId("Bullish Flag");
    pub const CUP_AND_HANDLE: PatternId = PatternId("Cup and Handle");
    pub const RISING_WEDGE: PatternId = PatternId("Rising Wedge");
    pub const SYMMETRICAL_TRIANGLE: PatternId = PatternId("Symmetrical Triangle");

    /// Builtin catalog in evaluation (and tie-break) order
    pub const CATALOG: [PatternId; 8] = [
        Self::HEAD_AND_SHOULDERS,
        Self::DOUBLE_BOTTOM,
        Self::ASCENDING_TRIANGLE,
        Self::TRIPLE_TOP,
        Self::BULLISH_FLAG,
        Self::CUP_AND_HANDLE,
        Self::RISING_WEDGE,
        Self::SYMMETRICAL_TRIANGLE,
    ];

    /// Returns the string identifier
    #[inline]
    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// Returns the direction the pattern trades on a confirmed breakout.
    ///
    /// `None` means the direction is only known once price leaves the formation
    /// (symmetrical triangle), or the pattern is not part of the builtin catalog.
    pub fn typical_direction(&self) -> Option<Direction> {
        match *self {
            Self::HEAD_AND_SHOULDERS
            | Self::DOUBLE_BOTTOM
            | Self::ASCENDING_TRIANGLE
            | Self::TRIPLE_TOP
            | Self::BULLISH_FLAG
            | Self::CUP_AND_HANDLE => Some(Direction::Bullish),
            Self::RISING_WEDGE => Some(Direction::Bearish),
            _ => None,
        }
    }

    /// Returns true if the breakout side decides the trade direction
    pub fn is_bidirectional(&self) -> bool {
        self.typical_direction().is_none()
    }
}

impl std::fmt::Display for PatternId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

impl Serialize for PatternId {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(self.0)
    }
}

/// Breakout direction of a pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Bullish,
    Bearish,
}

/// A geometrically significant point of a formation, for chart annotation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KeyPoint {
    pub role: &'static str,
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

/// Result of pattern detection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    #[serde(rename = "pattern_name")]
    pub pattern_id: PatternId,
    /// Heuristic strength score, nominally 0.0..=100.0, rounded to 2 decimals
    pub confidence: f64,
    pub entry_price: f64,
    /// Key points in the order the detector emits them; serialized as a role-keyed map
    #[serde(serialize_with = "serialize_key_points")]
    pub key_points: Vec<KeyPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakout_direction: Option<Direction>,
}

fn serialize_key_points<S: serde::Serializer>(
    points: &[KeyPoint],
    s: S,
) -> std::result::Result<S::Ok, S::Error> {
    #[derive(Serialize)]
    struct Point {
        timestamp: DateTime<Utc>,
        price: f64,
    }

    s.collect_map(points.iter().map(|p| (p.role, Point { timestamp: p.timestamp, price: p.price })))
}

impl Detection {
    pub fn new(pattern_id: PatternId, confidence: f64, entry_price: f64) -> Self {
        Self {
            pattern_id,
            confidence: detectors::round2(confidence),
            entry_price,
            key_points: Vec::new(),
            breakout_direction: None,
        }
    }

    /// Append a key point
    pub fn point(mut self, role: &'static str, timestamp: DateTime<Utc>, price: f64) -> Self {
        self.key_points.push(KeyPoint {
            role,
            timestamp,
            price,
        });
        self
    }

    pub fn with_breakout(mut self, direction: Direction) -> Self {
        self.breakout_direction = Some(direction);
        self
    }

    #[inline]
    pub fn pattern_name(&self) -> &'static str {
        self.pattern_id.as_str()
    }

    /// Look up a key point by role name
    pub fn key_point(&self, role: &str) -> Option<&KeyPoint> {
        self.key_points.iter().find(|p| p.role == role)
    }

    /// Stop-loss and take-profit levels at the given percentages off the entry.
    ///
    /// Levels are rounded to 2 decimals. Percentages must lie in (0, 100).
    pub fn trade_levels(&self, stop_loss_pct: f64, take_profit_pct: f64) -> Result<TradeLevels> {
        for (field, value) in [("stop_loss_pct", stop_loss_pct), ("take_profit_pct", take_profit_pct)] {
            if !(value > 0.0 && value < 100.0) {
                return Err(PatternError::OutOfRange {
                    field,
                    value,
                    min: 0.0,
                    max: 100.0,
                });
            }
        }

        Ok(TradeLevels {
            entry: self.entry_price,
            stop_loss: detectors::round2(self.entry_price * (1.0 - stop_loss_pct / 100.0)),
            take_profit: detectors::round2(self.entry_price * (1.0 + take_profit_pct / 100.0)),
        })
    }
}

/// Protective and target levels derived from a detection's entry price
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TradeLevels {
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
}

// ============================================================
// PATTERN DETECTOR TRAITS
// ============================================================

/// Generic chart pattern detector trait - for concrete types
///
/// `Ok(None)` means the pattern is absent (including too little history).
/// `Err` is an internal fault; the engine logs it and treats the detector as absent.
pub trait ChartDetector: Send + Sync {
    fn id(&self) -> PatternId;
    fn min_bars(&self) -> usize;
    fn detect<T: Ohlc>(&self, series: &Series<'_, T>) -> Result<Option<Detection>>;

    fn validate_config(&self) -> Result<()> {
        Ok(())
    }
}

/// Object-safe chart detector trait - for custom detectors
pub trait DynChartDetector: Send + Sync {
    fn id(&self) -> PatternId;
    fn min_bars(&self) -> usize;
    fn detect(&self, series: &Series<'_, &dyn Ohlc>) -> Result<Option<Detection>>;
    fn validate_config(&self) -> Result<()>;
}

impl<D: ChartDetector> DynChartDetector for D {
    fn id(&self) -> PatternId {
        ChartDetector::id(self)
    }

    fn min_bars(&self) -> usize {
        ChartDetector::min_bars(self)
    }

    fn detect(&self, series: &Series<'_, &dyn Ohlc>) -> Result<Option<Detection>> {
        ChartDetector::detect(self, series)
    }

    fn validate_config(&self) -> Result<()> {
        ChartDetector::validate_config(self)
    }
}

// ============================================================
// BUILTIN DETECTORS - generated via macro
// ============================================================

use detectors::*;

/// Macro to generate BuiltinDetector enum without boilerplate
macro_rules! define_builtin_detectors {
    (
        $(
            $variant:ident($detector:ty)
        ),* $(,)?
    ) => {
        /// All builtin detectors - fast path via enum dispatch
        #[derive(Debug, Clone)]
        pub enum BuiltinDetector {
            $($variant($detector)),*
        }

        impl BuiltinDetector {
            #[inline]
            pub fn detect<T: Ohlc>(&self, series: &Series<'_, T>) -> Result<Option<Detection>> {
                match self {
                    $(Self::$variant(d) => ChartDetector::detect(d, series)),*
                }
            }

            #[inline]
            pub fn id(&self) -> PatternId {
                match self {
                    $(Self::$variant(d) => ChartDetector::id(d)),*
                }
            }

            #[inline]
            pub fn min_bars(&self) -> usize {
                match self {
                    $(Self::$variant(d) => ChartDetector::min_bars(d)),*
                }
            }

            pub fn validate_config(&self) -> Result<()> {
                match self {
                    $(Self::$variant(d) => ChartDetector::validate_config(d)),*
                }
            }

            /// Every builtin detector with default thresholds, in catalog order
            pub fn catalog() -> Vec<BuiltinDetector> {
                vec![$(Self::$variant(<$detector>::default())),*]
            }
        }
    };
}

// Catalog order is the tie-break order of the selector
define_builtin_detectors! {
    HeadAndShoulders(HeadAndShouldersDetector),
    DoubleBottom(DoubleBottomDetector),
    AscendingTriangle(AscendingTriangleDetector),
    TripleTop(TripleTopDetector),
    BullishFlag(BullishFlagDetector),
    CupAndHandle(CupAndHandleDetector),
    RisingWedge(RisingWedgeDetector),
    SymmetricalTriangle(SymmetricalTriangleDetector),
}

// ============================================================
// PATTERN ENGINE
// ============================================================

/// Engine configuration
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Detections below this confidence are dropped before selection
    pub min_confidence: Option<f64>,
    /// Reject series that break the input contract instead of evaluating them
    pub validate_data: bool,
    pub pattern_filter: Option<Vec<PatternId>>,
}

/// Main pattern detection engine
pub struct PatternEngine {
    builtin: Vec<BuiltinDetector>,
    custom: Vec<Box<dyn DynChartDetector>>,
    config: EngineConfig,
}

impl Default for PatternEngine {
    /// Full builtin catalog with default thresholds, no filters
    fn default() -> Self {
        Self {
            builtin: BuiltinDetector::catalog(),
            custom: Vec::new(),
            config: EngineConfig::default(),
        }
    }
}

impl PatternEngine {
    /// Run every detector and return all detections, in catalog order.
    ///
    /// Custom detectors follow the builtin ones. Errors only when data validation
    /// is enabled and the series breaks the input contract.
    pub fn detect_all<T: Ohlc>(&self, bars: &[T]) -> Result<Vec<Detection>> {
        let series = if self.config.validate_data {
            Series::validated(bars)?
        } else {
            Series::new(bars)
        };

        let mut results = Vec::new();

        // Fast path: builtin detectors (enum dispatch, no vtable)
        for detector in &self.builtin {
            let id = detector.id();
            if series.len() < detector.min_bars() {
                tracing::trace!(pattern = %id, bars = series.len(), need = detector.min_bars(), "not enough history");
                continue;
            }
            self.collect(id, detector.detect(&series), &mut results);
        }

        // Slow path: custom detectors (vtable)
        if !self.custom.is_empty() {
            let bar_refs: Vec<&dyn Ohlc> = bars.iter().map(|b| b as &dyn Ohlc).collect();
            let dyn_series = Series::new(&bar_refs);
            for detector in &self.custom {
                let id = detector.id();
                if dyn_series.len() < detector.min_bars() {
                    continue;
                }
                self.collect(id, detector.detect(&dyn_series), &mut results);
            }
        }

        Ok(results)
    }

    /// Select the single strongest detection (the selector).
    ///
    /// Ties resolve to the detector evaluated first.
    pub fn detect<T: Ohlc>(&self, bars: &[T]) -> Result<Option<Detection>> {
        let best = select_best(self.detect_all(bars)?);
        if let Some(ref d) = best {
            tracing::debug!(pattern = %d.pattern_id, confidence = d.confidence, entry = d.entry_price, "selected pattern");
        }
        Ok(best)
    }

    /// Detectors in evaluation order
    pub fn detector_ids(&self) -> Vec<PatternId> {
        self.builtin
            .iter()
            .map(BuiltinDetector::id)
            .chain(self.custom.iter().map(|d| d.id()))
            .collect()
    }

    // ===========================================
    // Internal helpers
    // ===========================================

    fn collect(&self, id: PatternId, outcome: Result<Option<Detection>>, results: &mut Vec<Detection>) {
        match outcome {
            Ok(Some(detection)) => {
                tracing::debug!(pattern = %id, confidence = detection.confidence, "pattern fired");
                if self.should_include(&detection) {
                    results.push(detection);
                }
            }
            Ok(None) => {}
            Err(error) => {
                tracing::warn!(pattern = %id, %error, "detector fault, treating pattern as absent");
            }
        }
    }

    fn should_include(&self, d: &Detection) -> bool {
        if let Some(min) = self.config.min_confidence {
            if d.confidence < min {
                return false;
            }
        }
        if let Some(ref filter) = self.config.pattern_filter {
            if !filter.contains(&d.pattern_id) {
                return false;
            }
        }
        true
    }

    fn validate(&self) -> Result<()> {
        for d in &self.builtin {
            d.validate_config()?;
        }
        for d in &self.custom {
            d.validate_config()?;
        }
        if let Some(ref filter) = self.config.pattern_filter {
            if filter.is_empty() {
                return Err(PatternError::InvalidConfig("pattern filter admits no pattern".into()));
            }
        }
        if let Some(min) = self.config.min_confidence {
            if !(0.0..=100.0).contains(&min) {
                return Err(PatternError::OutOfRange {
                    field: "min_confidence",
                    value: min,
                    min: 0.0,
                    max: 100.0,
                });
            }
        }
        Ok(())
    }
}

/// Pick the detection with the highest confidence; the earliest wins a tie
pub fn select_best(detections: impl IntoIterator<Item = Detection>) -> Option<Detection> {
    detections.into_iter().fold(None, |best, d| match best {
        Some(b) if b.confidence >= d.confidence => Some(b),
        _ => Some(d),
    })
}

/// Evaluate the builtin catalog with default thresholds and return the strongest detection
pub fn detect_patterns<T: Ohlc>(bars: &[T]) -> Option<Detection> {
    // Without data validation the engine cannot fail
    PatternEngine::default().detect(bars).ok().flatten()
}

// ============================================================
// BUILDER
// ============================================================

/// Builder for creating PatternEngine instances
#[derive(Default)]
pub struct EngineBuilder {
    builtin: Vec<BuiltinDetector>,
    custom: Vec<Box<dyn DynChartDetector>>,
    config: EngineConfig,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the full builtin catalog with default configurations
    pub fn with_all_defaults(mut self) -> Self {
        self.builtin.extend(BuiltinDetector::catalog());
        self
    }

    /// Add reversal patterns only (head & shoulders, double bottom, triple top, rising wedge)
    pub fn with_reversal_defaults(mut self) -> Self {
        self.builtin.extend([
            BuiltinDetector::HeadAndShoulders(Default::default()),
            BuiltinDetector::DoubleBottom(Default::default()),
            BuiltinDetector::TripleTop(Default::default()),
            BuiltinDetector::RisingWedge(Default::default()),
        ]);
        self
    }

    /// Add continuation patterns only (ascending triangle, flag, cup and handle, symmetrical triangle)
    pub fn with_continuation_defaults(mut self) -> Self {
        self.builtin.extend([
            BuiltinDetector::AscendingTriangle(Default::default()),
            BuiltinDetector::BullishFlag(Default::default()),
            BuiltinDetector::CupAndHandle(Default::default()),
            BuiltinDetector::SymmetricalTriangle(Default::default()),
        ]);
        self
    }

    /// Add a builtin detector
    #[allow(clippy::should_implement_trait)]
    pub fn add(mut self, detector: BuiltinDetector) -> Self {
        self.builtin.push(detector);
        self
    }

    /// Add with config validation
    pub fn add_checked(mut self, detector: BuiltinDetector) -> Result<Self> {
        detector.validate_config()?;
        self.builtin.push(detector);
        Ok(self)
    }

    /// Add a custom detector (slow path)
    pub fn add_custom<D: DynChartDetector + 'static>(mut self, detector: D) -> Self {
        self.custom.push(Box::new(detector));
        self
    }

    /// Set minimum confidence filter
    pub fn min_confidence(mut self, confidence: f64) -> Self {
        self.config.min_confidence = Some(confidence);
        self
    }

    /// Enable/disable data validation
    pub fn validate_data(mut self, enable: bool) -> Self {
        self.config.validate_data = enable;
        self
    }

    /// Filter to specific patterns only
    pub fn only_patterns(mut self, ids: impl IntoIterator<Item = PatternId>) -> Self {
        self.config.pattern_filter = Some(ids.into_iter().collect());
        self
    }

    /// Build the engine
    pub fn build(self) -> Result<PatternEngine> {
        let engine = PatternEngine {
            builtin: self.builtin,
            custom: self.custom,
            config: self.config,
        };
        engine.validate()?;
        Ok(engine)
    }
}

// ============================================================
// PARALLEL SCANNING
// ============================================================

use rayon::prelude::*;

/// Result of scanning a single instrument
#[derive(Debug)]
pub struct ScanResult {
    pub symbol: String,
    pub detection: Option<Detection>,
}

/// Error from scanning a single instrument
#[derive(Debug)]
pub struct ScanError {
    pub symbol: String,
    pub error: PatternError,
}

/// Parallel scanning of multiple instruments, one selector pass each
pub fn scan_parallel<'a, T, I>(engine: &PatternEngine, instruments: I) -> (Vec<ScanResult>, Vec<ScanError>)
where
    T: Ohlc + Sync + 'a,
    I: IntoParallelIterator<Item = (&'a str, &'a [T])>,
{
    let results: Vec<_> = instruments
        .into_par_iter()
        .map(|(symbol, bars)| {
            engine
                .detect(bars)
                .map(|detection| ScanResult {
                    symbol: symbol.to_string(),
                    detection,
                })
                .map_err(|error| ScanError {
                    symbol: symbol.to_string(),
                    error,
                })
        })
        .collect();

    let mut successes = Vec::new();
    let mut errors = Vec::new();

    for result in results {
        match result {
            Ok(r) => successes.push(r),
            Err(e) => errors.push(e),
        }
    }

    (successes, errors)
}

// ============================================================
// TESTS
// ============================================================
