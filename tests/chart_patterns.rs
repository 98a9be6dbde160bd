//! Integration tests for chart pattern detection.
//!
//! Each fixture is a hand-shaped series that fires exactly one catalog detector.

use std::collections::HashMap;

use chartform::prelude::*;
use chrono::{DateTime, Duration, TimeZone, Utc};

/// Test bar with its own timestamp
#[derive(Debug, Clone, Copy)]
struct TestBar {
    t: DateTime<Utc>,
    o: f64,
    h: f64,
    l: f64,
    c: f64,
}

impl Ohlc for TestBar {
    fn open(&self) -> f64 {
        self.o
    }

    fn high(&self) -> f64 {
        self.h
    }

    fn low(&self) -> f64 {
        self.l
    }

    fn close(&self) -> f64 {
        self.c
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.t
    }
}

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
}

fn hour(i: usize) -> DateTime<Utc> {
    base() + Duration::hours(i as i64)
}

fn bar(i: usize, o: f64, h: f64, l: f64, c: f64) -> TestBar {
    TestBar { t: hour(i), o, h, l, c }
}

/// Piecewise-linear closes: each leg moves to `target` in `steps` equal steps
fn path(start: f64, legs: &[(f64, usize)]) -> Vec<f64> {
    let mut closes = vec![start];
    for &(target, steps) in legs {
        let from = *closes.last().unwrap();
        closes.extend((0..steps).map(|k| from + (target - from) * (k + 1) as f64 / steps as f64));
    }
    closes
}

/// Hourly bars around the given closes, half a point either side
fn from_closes(closes: &[f64]) -> Vec<TestBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| bar(i, c, c + 0.5, c - 0.5, c))
        .collect()
}

fn detect_with<D: ChartDetector>(detector: &D, bars: &[TestBar]) -> Option<Detection> {
    detector.detect(&Series::new(bars)).unwrap()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ============================================================
// FIXTURES
// ============================================================

/// Shoulders at 100 and 110 around a 115 head, fading to 104
fn head_and_shoulders() -> Vec<TestBar> {
    from_closes(&path(90.0, &[(100.0, 8), (95.0, 5), (115.0, 10), (102.0, 8), (110.0, 8), (104.0, 6)]))
}

/// Troughs at 100 and 101 around a 110 peak, breaking out to 112
fn double_bottom() -> Vec<TestBar> {
    from_closes(&path(130.0, &[(100.0, 15), (110.0, 6), (101.0, 6), (112.0, 6)]))
}

/// Twenty candles capped at 110 over rising lows, then a close at 111
fn ascending_triangle_tail(bars: &mut Vec<TestBar>) {
    for k in 0..20 {
        let c = 100.0 + 0.5 * k as f64;
        bars.push(bar(39 + k, c - 0.2, 110.0, c - 1.0, c));
    }
    bars.push(bar(59, 109.5, 111.5, 109.0, 111.0));
}

fn ascending_triangle() -> Vec<TestBar> {
    let mut bars: Vec<TestBar> = (0..39)
        .map(|i| {
            let c = if i % 2 == 1 { 100.5 } else { 100.0 };
            bar(i, c, c + 0.5, c - 0.5, c)
        })
        .collect();
    ascending_triangle_tail(&mut bars);
    bars
}

/// A double bottom (troughs 95 and 96) resolving into the ascending triangle
fn double_bottom_into_triangle() -> Vec<TestBar> {
    let mut bars = from_closes(&path(104.0, &[(95.0, 9), (100.0, 6), (96.0, 6), (99.5, 17)]));
    ascending_triangle_tail(&mut bars);
    bars
}

/// Highs peaking at 100.5, 101.0 and 100.7, then a close at 102
fn triple_top() -> Vec<TestBar> {
    from_closes(&path(
        90.0,
        &[(100.0, 5), (95.0, 4), (100.5, 4), (95.0, 4), (100.2, 4), (95.0, 4), (102.0, 6)],
    ))
}

/// Pole from 100 to `top`, a gently falling flag, then a close one point above `top`
fn bullish_flag(top: f64) -> Vec<TestBar> {
    let mut closes = path(100.0, &[(top, 19)]);
    closes.extend((0..20).map(|k| top - 0.5 - 0.05 * k as f64));
    closes.push(top + 1.0);
    from_closes(&closes)
}

/// Cup from `left_rim` down to `bottom` and up to `right_rim`, then a handle
/// between 107.5 and 108.8 and a close at 110.2
fn cup(left_rim: f64, bottom: f64, right_rim: f64) -> Vec<TestBar> {
    let mut closes = vec![left_rim; 4];
    closes.extend(path(left_rim, &[(bottom, 15), (right_rim, 15)]));
    closes.extend([
        108.8, 107.8, 107.5, 107.5, 108.0, 108.0, 107.5, 107.5, 108.0, 108.0, 107.5, 107.5, 108.0,
        108.0, 110.2,
    ]);
    from_closes(&closes)
}

fn cup_and_handle() -> Vec<TestBar> {
    cup(110.0, 100.0, 110.0)
}

/// Same bars with `minutes` between candles instead of an hour
fn respaced(bars: Vec<TestBar>, minutes: i64) -> Vec<TestBar> {
    bars.into_iter()
        .enumerate()
        .map(|(i, b)| TestBar { t: base() + Duration::minutes(minutes * i as i64), ..b })
        .collect()
}

/// Both trendlines rising and converging; the last candle falls back to support
fn rising_wedge(crossed_last: bool) -> Vec<TestBar> {
    let mut bars: Vec<TestBar> = (0..29)
        .map(|i| {
            let (lo, hi) = (100.0 + 0.5 * i as f64, 110.0 + 0.3 * i as f64);
            let c = (lo + hi) / 2.0;
            bar(i, c, hi, lo, c)
        })
        .collect();
    if crossed_last {
        bars.push(bar(29, 99.5, 99.0, 100.0, 99.5));
    } else {
        bars.push(bar(29, 103.0, 104.0, 99.8, 100.2));
    }
    bars
}

/// Highs falling from 120, lows rising from 100, then a breakout candle
fn symmetrical_triangle(bullish: bool) -> Vec<TestBar> {
    let mut bars: Vec<TestBar> = (0..30)
        .map(|i| {
            let (hi, lo) = (120.0 - 0.3 * i as f64, 100.0 + 0.3 * i as f64);
            let c = (hi + lo) / 2.0;
            bar(i, c, hi, lo, c)
        })
        .collect();
    if bullish {
        bars.push(bar(30, 110.0, 122.0, 109.5, 121.5));
    } else {
        bars.push(bar(30, 110.0, 110.5, 98.5, 99.0));
    }
    bars
}

fn flat(n: usize) -> Vec<TestBar> {
    (0..n).map(|i| bar(i, 100.0, 100.5, 99.5, 100.0)).collect()
}

// ============================================================
// REVERSAL PATTERNS
// ============================================================

#[test]
fn test_head_and_shoulders_detected() {
    init_tracing();
    let bars = head_and_shoulders();

    let d = detect_patterns(&bars).expect("head & shoulders");
    assert_eq!(d.pattern_name(), "Head & Shoulders");
    assert!(d.confidence >= 85.0);
    assert_eq!(d.confidence, 89.13);
    assert_eq!(d.entry_price, 100.0);

    let head = d.key_point("Head").unwrap();
    assert_eq!(head.timestamp, hour(23));
    assert_eq!(head.price, 115.0);
    // the neckline sits on the lower (left) shoulder
    assert_eq!(d.key_point("Neckline").unwrap().timestamp, hour(8));

    let roles: Vec<&str> = d.key_points.iter().map(|p| p.role).collect();
    assert_eq!(roles, ["Left Shoulder", "Head", "Right Shoulder", "Neckline"]);
}

#[test]
fn test_head_and_shoulders_needs_wall_clock_gap() {
    // Same shape on 15-minute candles: peaks only 3.75h apart
    let bars = respaced(head_and_shoulders(), 15);

    assert!(detect_with(&HeadAndShouldersDetector::default(), &bars).is_none());
}

#[test]
fn test_head_and_shoulders_rejects_without_breakout() {
    let mut bars = head_and_shoulders();
    let last = bars.len() - 1;
    // 100.4 < neckline * 1.005
    bars[last].c = 100.4;
    assert!(detect_with(&HeadAndShouldersDetector::default(), &bars).is_none());
}

#[test]
fn test_double_bottom_entry_is_peak() {
    let bars = double_bottom();

    let d = detect_patterns(&bars).expect("double bottom");
    assert_eq!(d.pattern_name(), "Double Bottom");
    assert_eq!(d.confidence, 89.85);
    assert_eq!(d.entry_price, 110.0);

    let resistance = d.key_point("Resistance").unwrap();
    assert_eq!(resistance.price, d.entry_price);
    assert_eq!(resistance.timestamp, hour(21));
    assert_eq!(d.key_point("First Low").unwrap().timestamp, hour(15));
    assert_eq!(d.key_point("Second Low").unwrap().timestamp, hour(27));

    let entry = d.key_point("Entry").unwrap();
    assert_eq!(entry.timestamp, hour(33));
    assert_eq!(entry.price, 112.0);
    assert!(d.breakout_direction.is_none());
}

#[test]
fn test_double_bottom_rsi_filter() {
    let bars = double_bottom();
    // RSI at the second trough is about 26
    let strict = DoubleBottomDetector { max_rsi: 20.0, ..Default::default() };
    assert!(detect_with(&strict, &bars).is_none());
    assert!(detect_with(&DoubleBottomDetector::default(), &bars).is_some());
}

#[test]
fn test_double_bottom_needs_wall_clock_gap() {
    // troughs 12 candles apart: 3h on 15-minute candles
    let bars = respaced(double_bottom(), 15);
    assert!(detect_with(&DoubleBottomDetector::default(), &bars).is_none());
    assert!(detect_with(&DoubleBottomDetector::default(), &double_bottom()).is_some());
}

#[test]
fn test_triple_top_detected() {
    let bars = triple_top();

    let d = detect_patterns(&bars).expect("triple top");
    assert_eq!(d.pattern_name(), "Triple Top");
    assert_eq!(d.confidence, 84.95);
    assert_eq!(d.entry_price, 101.0);
    assert_eq!(d.key_point("Peak 2").unwrap().timestamp, hour(13));
}

#[test]
fn test_triple_top_needs_wall_clock_gap() {
    // peaks 8 candles apart: 4h on 30-minute candles
    let bars = respaced(triple_top(), 30);
    assert!(detect_with(&TripleTopDetector::default(), &bars).is_none());
}

#[test]
fn test_triple_top_rejects_wide_peak_spread() {
    // middle peak at 103 against 100.5 and 100.7: 2.4% spread
    let bars = from_closes(&path(
        90.0,
        &[(100.0, 5), (95.0, 4), (102.5, 4), (95.0, 4), (100.2, 4), (95.0, 4), (102.0, 6)],
    ));
    assert!(detect_with(&TripleTopDetector::default(), &bars).is_none());
}

// ============================================================
// TRIANGLES & WEDGES
// ============================================================

#[test]
fn test_ascending_triangle_detected() {
    let bars = ascending_triangle();

    let d = detect_patterns(&bars).expect("ascending triangle");
    assert_eq!(d.pattern_name(), "Ascending Triangle");
    assert_eq!(d.confidence, 90.0);
    assert_eq!(d.entry_price, 110.0);
    assert_eq!(d.key_point("Resistance").unwrap().timestamp, hour(39));
    assert_eq!(d.key_point("Support Start").unwrap().price, 99.0);
    assert_eq!(d.key_point("Entry").unwrap().timestamp, hour(59));
}

#[test]
fn test_ascending_triangle_needs_macd_history() {
    // 33 candles: the MACD histogram is not defined yet
    let bars = ascending_triangle();
    let short: Vec<TestBar> = bars[bars.len() - 33..].to_vec();
    assert!(detect_with(&AscendingTriangleDetector::default(), &short).is_none());
}

#[test]
fn test_symmetrical_triangle_bullish_breakout() {
    let d = detect_patterns(&symmetrical_triangle(true)).expect("symmetrical triangle");
    assert_eq!(d.pattern_name(), "Symmetrical Triangle");
    assert_eq!(d.confidence, 88.05);
    assert_eq!(d.entry_price, 120.0);
    assert_eq!(d.breakout_direction, Some(Direction::Bullish));
    assert_eq!(d.key_point("High End").unwrap().timestamp, hour(29));
}

#[test]
fn test_symmetrical_triangle_bearish_breakout() {
    let d = detect_with(&SymmetricalTriangleDetector::default(), &symmetrical_triangle(false)).unwrap();
    assert_eq!(d.entry_price, 100.0);
    assert_eq!(d.breakout_direction, Some(Direction::Bearish));
}

#[test]
fn test_symmetrical_triangle_without_breakout_is_absent() {
    let mut bars = symmetrical_triangle(true);
    let last = bars.len() - 1;
    bars[last] = bar(30, 110.0, 112.0, 109.0, 111.0);
    assert!(detect_with(&SymmetricalTriangleDetector::default(), &bars).is_none());
}

#[test]
fn test_rising_wedge_detected() {
    let d = detect_patterns(&rising_wedge(false)).expect("rising wedge");
    assert_eq!(d.pattern_name(), "Rising Wedge");
    assert_eq!(d.confidence, 83.7);
    assert_eq!(d.entry_price, 99.8);
    assert_eq!(d.key_point("Low Start").unwrap().price, 100.0);
}

#[test]
fn test_rising_wedge_absent_once_support_is_reclaimed() {
    let mut bars = rising_wedge(false);
    // support 99.8; 100.5 > 99.8 * 1.005
    bars[29].c = 100.5;
    assert!(detect_with(&RisingWedgeDetector::default(), &bars).is_none());
}

#[test]
fn test_undefined_slope_is_not_a_trendline() {
    let mut wedge = rising_wedge(false);
    wedge[10].h = f64::NAN;
    assert!(detect_with(&RisingWedgeDetector::default(), &wedge).is_none());

    let mut triangle = ascending_triangle();
    triangle[45].l = f64::NAN;
    assert!(detect_with(&AscendingTriangleDetector::default(), &triangle).is_none());
}

#[test]
fn test_rising_wedge_confidence_is_unclamped() {
    // A crossed last candle (high < low) makes the end spread negative
    let bars = rising_wedge(true);
    let d = detect_with(&RisingWedgeDetector::default(), &bars).unwrap();
    assert_eq!(d.confidence, 91.5);
    assert!(d.confidence > 90.0);

    // A validating engine refuses the series instead
    let engine = EngineBuilder::new().with_all_defaults().validate_data(true).build().unwrap();
    assert!(matches!(engine.detect(&bars), Err(PatternError::InvalidOhlc { index: 29, .. })));
}

// ============================================================
// CONTINUATION PATTERNS
// ============================================================

#[test]
fn test_bullish_flag_detected() {
    let d = detect_patterns(&bullish_flag(110.0)).expect("bullish flag");
    assert_eq!(d.pattern_name(), "Bullish Flag");
    assert_eq!(d.confidence, 90.0);
    assert_eq!(d.entry_price, 109.5);
    assert_eq!(d.key_point("Flagpole Start").unwrap().timestamp, hour(0));
    assert_eq!(d.key_point("Flagpole End").unwrap().price, 110.0);
    assert_eq!(d.key_point("Flag High").unwrap().timestamp, hour(20));
}

#[test]
fn test_bullish_flag_confidence_capped() {
    // 20% pole would score 100 unclamped
    let d = detect_with(&BullishFlagDetector::default(), &bullish_flag(120.0)).unwrap();
    assert_eq!(d.confidence, 95.0);
}

#[test]
fn test_bullish_flag_needs_pole() {
    let bars = bullish_flag(103.0);
    assert!(detect_with(&BullishFlagDetector::default(), &bars).is_none());
}

#[test]
fn test_cup_and_handle_detected() {
    let d = detect_patterns(&cup_and_handle()).expect("cup and handle");
    assert_eq!(d.pattern_name(), "Cup and Handle");
    assert_eq!(d.confidence, 89.62);
    assert!((d.entry_price - 108.96).abs() < 1e-9);

    assert_eq!(d.key_point("Cup Left Max").unwrap().timestamp, hour(4));
    assert_eq!(d.key_point("Cup Bottom").unwrap().timestamp, hour(21));
    assert_eq!(d.key_point("Cup Right Max").unwrap().timestamp, hour(35));
    assert_eq!(d.key_point("Handle End").unwrap().price, 110.2);
}

#[test]
fn test_cup_and_handle_rejects_wide_handle() {
    let mut bars = cup_and_handle();
    bars[42].c = 104.0;
    assert!(detect_with(&CupAndHandleDetector::default(), &bars).is_none());
}

#[test]
fn test_cup_and_handle_rejects_uneven_rims() {
    // left rim 120 against a right rim of 110
    let bars = cup(120.0, 100.0, 110.0);
    assert!(detect_with(&CupAndHandleDetector::default(), &bars).is_none());
}

#[test]
fn test_cup_and_handle_rejects_shallow_cup() {
    // a 106 bottom sits under 5% below the 110 rims
    let bars = cup(110.0, 106.0, 110.0);
    assert!(detect_with(&CupAndHandleDetector::default(), &bars).is_none());
}

#[test]
fn test_cup_and_handle_early_bottom_counts_warm_up() {
    // smoothed bottom at index 6: only three defined points on the left
    let mut closes = vec![110.0; 5];
    closes.extend([96.0, 96.0, 112.0]);
    closes.extend([110.0; 41]);
    closes.push(111.0);
    let bars = from_closes(&closes);

    let d = detect_with(&CupAndHandleDetector::default(), &bars).expect("cup and handle");
    assert_eq!(d.confidence, 89.86);
    assert!((d.entry_price - 110.4).abs() < 1e-9);
    assert_eq!(d.key_point("Cup Left Max").unwrap().timestamp, hour(4));
    assert_eq!(d.key_point("Cup Bottom").unwrap().timestamp, hour(6));
    assert_eq!(d.key_point("Cup Right Max").unwrap().timestamp, hour(11));
    assert_eq!(d.key_point("Handle End").unwrap().timestamp, hour(49));
}

// ============================================================
// SELECTOR
// ============================================================

#[test]
fn test_flat_series_has_no_pattern() {
    assert!(detect_patterns(&flat(60)).is_none());
}

#[test]
fn test_empty_and_single_candle() {
    assert!(detect_patterns::<TestBar>(&[]).is_none());
    assert!(detect_patterns(&flat(1)).is_none());
}

#[test]
fn test_higher_confidence_wins() {
    let bars = double_bottom_into_triangle();
    let engine = PatternEngine::default();

    let all = engine.detect_all(&bars).unwrap();
    let names: Vec<&str> = all.iter().map(Detection::pattern_name).collect();
    assert_eq!(names, ["Double Bottom", "Ascending Triangle"]);
    assert_eq!(all[0].confidence, 89.84);
    assert_eq!(all[1].confidence, 90.0);

    let best = engine.detect(&bars).unwrap().unwrap();
    assert_eq!(best.pattern_name(), "Ascending Triangle");
}

#[test]
fn test_selector_is_deterministic() {
    let bars = double_bottom_into_triangle();
    let first = detect_patterns(&bars);
    for _ in 0..5 {
        assert_eq!(detect_patterns(&bars), first);
    }
}

#[test]
fn test_every_detector_absent_below_min_bars() {
    let bars = double_bottom_into_triangle();
    for detector in BuiltinDetector::catalog() {
        let need = detector.min_bars();
        let short = &bars[bars.len() - (need - 1)..];
        let outcome = detector.detect(&Series::new(short)).unwrap();
        assert!(outcome.is_none(), "{} fired on {} bars", detector.id(), short.len());
    }
}

#[test]
fn test_pattern_filter_and_min_confidence() {
    let bars = double_bottom_into_triangle();

    let only_db = EngineBuilder::new()
        .with_all_defaults()
        .only_patterns([PatternId::DOUBLE_BOTTOM])
        .build()
        .unwrap();
    assert_eq!(only_db.detect(&bars).unwrap().unwrap().pattern_name(), "Double Bottom");

    let strict = EngineBuilder::new().with_all_defaults().min_confidence(95.0).build().unwrap();
    assert!(strict.detect(&bars).unwrap().is_none());
}

#[test]
fn test_family_builders() {
    let reversal = EngineBuilder::new().with_reversal_defaults().build().unwrap();
    assert!(reversal.detect(&ascending_triangle()).unwrap().is_none());
    assert!(reversal.detect(&rising_wedge(false)).unwrap().is_some());

    let continuation = EngineBuilder::new().with_continuation_defaults().build().unwrap();
    assert!(continuation.detect(&double_bottom()).unwrap().is_none());
    assert!(continuation.detect(&cup_and_handle()).unwrap().is_some());
}

#[test]
fn test_scan_parallel_keeps_instrument_order() {
    let hs = head_and_shoulders();
    let db = double_bottom();
    let quiet = flat(60);
    let engine = PatternEngine::default();

    let instruments: Vec<(&str, &[TestBar])> =
        vec![("BTCUSDT", hs.as_slice()), ("ETHUSDT", db.as_slice()), ("SOLUSDT", quiet.as_slice())];
    let (results, errors) = scan_parallel(&engine, instruments);

    assert!(errors.is_empty());
    let picked: Vec<(&str, Option<&str>)> = results
        .iter()
        .map(|r| (r.symbol.as_str(), r.detection.as_ref().map(Detection::pattern_name)))
        .collect();
    assert_eq!(
        picked,
        [
            ("BTCUSDT", Some("Head & Shoulders")),
            ("ETHUSDT", Some("Double Bottom")),
            ("SOLUSDT", None),
        ]
    );
}

// ============================================================
// OUTPUT SHAPE
// ============================================================

#[test]
fn test_detection_json_shape() {
    let d = detect_patterns(&double_bottom()).unwrap();
    let json = serde_json::to_value(&d).unwrap();

    assert_eq!(json["pattern_name"], "Double Bottom");
    assert_eq!(json["confidence"], 89.85);
    assert_eq!(json["entry_price"], 110.0);
    assert!(json.get("breakout_direction").is_none());
    assert_eq!(json["key_points"]["First Low"]["timestamp"], "2024-03-01T15:00:00Z");
    assert_eq!(json["key_points"]["First Low"]["price"], 100.0);
    assert_eq!(json["key_points"].as_object().unwrap().len(), 4);

    // roles are written in emission order
    let text = serde_json::to_string(&d).unwrap();
    let order: Vec<usize> = ["First Low", "Second Low", "Resistance", "Entry"]
        .iter()
        .map(|role| text.find(role).unwrap())
        .collect();
    assert!(order.windows(2).all(|w| w[0] < w[1]));

    let st = detect_patterns(&symmetrical_triangle(true)).unwrap();
    let json = serde_json::to_value(&st).unwrap();
    assert_eq!(json["breakout_direction"], "bullish");
}

#[test]
fn test_candle_round_trips_through_json() {
    let json = r#"{"timestamp":"2024-03-01T05:00:00Z","open":1.5,"high":2.0,"low":1.0,"close":1.75}"#;
    let candle: Candle = serde_json::from_str(json).unwrap();
    assert_eq!(candle.timestamp, hour(5));
    assert_eq!(candle.close(), 1.75);
}

#[test]
fn test_trade_levels_from_detection() {
    let d = detect_patterns(&double_bottom()).unwrap();
    let levels = d.trade_levels(2.0, 5.0).unwrap();
    assert_eq!(levels.entry, 110.0);
    assert_eq!(levels.stop_loss, 107.8);
    assert_eq!(levels.take_profit, 115.5);
}

// ============================================================
// PARAMETERS
// ============================================================

fn check_param_table<D: ParameterizedDetector>() {
    for meta in D::param_meta() {
        assert!(meta.validate(meta.default).is_ok(), "{}: default outside its range", meta.name);
    }
    assert!(D::with_params(&HashMap::new()).is_ok());
}

#[test]
fn test_param_tables_are_consistent() {
    check_param_table::<HeadAndShouldersDetector>();
    check_param_table::<DoubleBottomDetector>();
    check_param_table::<AscendingTriangleDetector>();
    check_param_table::<TripleTopDetector>();
    check_param_table::<BullishFlagDetector>();
    check_param_table::<CupAndHandleDetector>();
    check_param_table::<RisingWedgeDetector>();
    check_param_table::<SymmetricalTriangleDetector>();
}

#[test]
fn test_with_params_overrides_threshold() {
    let mut params = HashMap::new();
    params.insert("min_gap_hours", 20.0);
    let wide = HeadAndShouldersDetector::with_params(&params).unwrap();
    assert!(detect_with(&wide, &head_and_shoulders()).is_none());

    params.insert("min_gap_hours", -1.0);
    assert!(HeadAndShouldersDetector::with_params(&params).is_err());
}

#[test]
fn test_oversized_window_is_never_enough_history() {
    let mut params = HashMap::new();
    params.insert("window", 1e19);
    params.insert("rsi_period", 1e19);

    let flag = BullishFlagDetector::with_params(&params).unwrap();
    assert_eq!(ChartDetector::min_bars(&flag), usize::MAX);
    assert!(detect_with(&flag, &bullish_flag(110.0)).is_none());

    let engine = EngineBuilder::new()
        .add_checked(BuiltinDetector::BullishFlag(flag))
        .unwrap()
        .add_checked(BuiltinDetector::DoubleBottom(DoubleBottomDetector::with_params(&params).unwrap()))
        .unwrap()
        .add_checked(BuiltinDetector::AscendingTriangle(AscendingTriangleDetector::with_params(&params).unwrap()))
        .unwrap()
        .add_checked(BuiltinDetector::SymmetricalTriangle(SymmetricalTriangleDetector::with_params(&params).unwrap()))
        .unwrap()
        .build()
        .unwrap();
    assert!(engine.detect(&flat(60)).unwrap().is_none());
    assert!(engine.detect(&bullish_flag(110.0)).unwrap().is_none());
}

#[test]
fn test_custom_parameters_in_engine() {
    let mut params = HashMap::new();
    params.insert("window", 25.0);
    let detector = SymmetricalTriangleDetector::with_params(&params).unwrap();

    let engine = EngineBuilder::new()
        .add_checked(BuiltinDetector::SymmetricalTriangle(detector))
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(engine.detector_ids(), [PatternId::SYMMETRICAL_TRIANGLE]);

    let bad = HeadAndShouldersDetector { max_rsi: 140.0, ..Default::default() };
    assert!(EngineBuilder::new().add_checked(BuiltinDetector::HeadAndShoulders(bad)).is_err());
}
