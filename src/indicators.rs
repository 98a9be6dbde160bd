//! Extrema and trend utilities shared by the detectors
//!
//! Everything here works on plain `f64` columns taken from a [`Series`](crate::Series).
//! Indicators that need a warm-up return `Vec<Option<f64>>` aligned with their input,
//! with `None` where the value is not yet defined.

/// MACD fast EMA span
pub const MACD_FAST: usize = 12;
/// MACD slow EMA span
pub const MACD_SLOW: usize = 26;
/// MACD signal EMA span
pub const MACD_SIGNAL: usize = 9;
/// Closes needed before the MACD histogram is defined
pub const MACD_MIN_BARS: usize = MACD_SLOW + MACD_SIGNAL - 1;

// ============================================================
// LOCAL EXTREMA
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Extremum {
    Max,
    Min,
}

/// Lazy iterator over indices of strict local extrema (three-point window).
///
/// The sequence is finite and restartable: clone an unstarted iterator, or call
/// [`local_maxima`] / [`local_minima`] again, for a fresh pass.
#[derive(Debug, Clone)]
pub struct LocalExtrema<'a> {
    values: &'a [f64],
    next: usize,
    kind: Extremum,
}

impl Iterator for LocalExtrema<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while self.next + 1 < self.values.len() {
            let i = self.next;
            self.next += 1;
            let (prev, cur, next) = (self.values[i - 1], self.values[i], self.values[i + 1]);
            let hit = match self.kind {
                Extremum::Max => cur > prev && cur > next,
                Extremum::Min => cur < prev && cur < next,
            };
            if hit {
                return Some(i);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.values.len().saturating_sub(self.next + 1)))
    }
}

/// Indices strictly greater than both neighbors. The endpoints never qualify.
pub fn local_maxima(values: &[f64]) -> LocalExtrema<'_> {
    LocalExtrema {
        values,
        next: 1,
        kind: Extremum::Max,
    }
}

/// Indices strictly less than both neighbors. The endpoints never qualify.
pub fn local_minima(values: &[f64]) -> LocalExtrema<'_> {
    LocalExtrema {
        values,
        next: 1,
        kind: Extremum::Min,
    }
}

// ============================================================
// TREND / DISPERSION
// ============================================================

/// Least-squares slope of `window` against positions `0..N-1`.
///
/// Computed on mean-centered values so large price levels don't swamp the
/// cross products. `None` for fewer than two points.
pub fn fit_linear_slope(window: &[f64]) -> Option<f64> {
    let n = window.len();
    if n < 2 {
        return None;
    }
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = window.iter().sum::<f64>() / n as f64;

    let (num, den) = window.iter().enumerate().fold((0.0, 0.0), |(num, den), (i, y)| {
        let dx = i as f64 - x_mean;
        (num + dx * (y - y_mean), den + dx * dx)
    });
    Some(num / den)
}

/// Sample standard deviation (n - 1 divisor). `None` for fewer than two points.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let ss: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    Some((ss / (n - 1) as f64).sqrt())
}

/// Simple moving average; the first `window - 1` entries are `None`
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    (0..values.len())
        .map(|i| {
            (i + 1 >= window).then(|| values[i + 1 - window..=i].iter().sum::<f64>() / window as f64)
        })
        .collect()
}

// ============================================================
// MOMENTUM
// ============================================================

/// Recursive exponential average with smoothing factor `alpha`, seeded with the
/// first value; defined once `min_periods` values have been seen.
fn ewm(values: &[f64], alpha: f64, min_periods: usize) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    let mut acc: Option<f64> = None;
    for (i, v) in values.iter().enumerate() {
        let next = match acc {
            None => *v,
            Some(prev) => (1.0 - alpha) * prev + alpha * v,
        };
        acc = Some(next);
        out.push((i + 1 >= min_periods).then_some(next));
    }
    out
}

/// Exponential moving average with `alpha = 2 / (span + 1)`, defined from index `span - 1`
pub fn ema(values: &[f64], span: usize) -> Vec<Option<f64>> {
    ewm(values, 2.0 / (span as f64 + 1.0), span)
}

/// Relative Strength Index with Wilder smoothing (`alpha = 1 / period`).
///
/// Gains and losses start from zero at the first bar, so the value is defined from
/// index `period - 1`. An average loss of zero yields 100.
pub fn relative_strength_index(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 || closes.is_empty() {
        return vec![None; closes.len()];
    }

    let diffs = std::iter::once(0.0).chain(closes.windows(2).map(|w| w[1] - w[0]));
    let (gains, losses): (Vec<f64>, Vec<f64>) = diffs.map(|d| (d.max(0.0), (-d).max(0.0))).unzip();

    let alpha = 1.0 / period as f64;
    let avg_gain = ewm(&gains, alpha, period);
    let avg_loss = ewm(&losses, alpha, period);

    avg_gain
        .into_iter()
        .zip(avg_loss)
        .map(|(g, l)| match (g, l) {
            (Some(_), Some(l)) if l == 0.0 => Some(100.0),
            (Some(g), Some(l)) => Some(100.0 - 100.0 / (1.0 + g / l)),
            _ => None,
        })
        .collect()
}

/// MACD(12, 26) line minus its 9-period signal line.
///
/// The signal EMA starts at the first defined MACD value, so the histogram is
/// defined from index [`MACD_MIN_BARS`]` - 1`.
pub fn macd_histogram(closes: &[f64]) -> Vec<Option<f64>> {
    let fast = ema(closes, MACD_FAST);
    let slow = ema(closes, MACD_SLOW);
    let macd: Vec<Option<f64>> = fast
        .iter()
        .zip(&slow)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();

    let Some(first) = macd.iter().position(Option::is_some) else {
        return vec![None; closes.len()];
    };
    let defined: Vec<f64> = macd[first..].iter().flatten().copied().collect();
    let signal = ema(&defined, MACD_SIGNAL);

    let mut out = vec![None; first];
    out.extend(
        defined
            .iter()
            .zip(signal)
            .map(|(m, s)| s.map(|s| m - s)),
    );
    out
}
