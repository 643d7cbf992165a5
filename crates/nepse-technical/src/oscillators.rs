use nepse_core::stats::{highest, lowest, range_position, true_range};
use nepse_core::{Bar, EngineError, IndicatorKind, IndicatorPoint, IndicatorSeries};

use crate::moving_average::{ema, sma};
use crate::{fallback_point, prepare, tail_aligned};

/// RSI returned when there are fewer than `period + 1` closes.
pub const RSI_NEUTRAL: f64 = 50.0;

/// ADX returned when there are fewer than `period + 1` bars.
pub const ADX_NEUTRAL: f64 = 25.0;

/// Relative Strength Index with simple (not Wilder) averaging over a
/// trailing window of `period` price changes. One value per close from
/// index `period` onward.
pub fn rsi(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() <= period {
        return vec![];
    }

    let mut gains = Vec::with_capacity(data.len() - 1);
    let mut losses = Vec::with_capacity(data.len() - 1);

    for i in 1..data.len() {
        let change = data[i] - data[i - 1];
        if change > 0.0 {
            gains.push(change);
            losses.push(0.0);
        } else {
            gains.push(0.0);
            losses.push(change.abs());
        }
    }

    let mut rsi_values = Vec::with_capacity(gains.len() + 1 - period);

    for end in period..=gains.len() {
        let avg_gain = gains[end - period..end].iter().sum::<f64>() / period as f64;
        let avg_loss = losses[end - period..end].iter().sum::<f64>() / period as f64;

        let rsi = if avg_loss == 0.0 {
            100.0
        } else {
            let rs = avg_gain / avg_loss;
            100.0 - (100.0 / (1.0 + rs))
        };
        rsi_values.push(rsi);
    }

    rsi_values
}

/// MACD (Moving Average Convergence Divergence)
pub struct MacdResult {
    pub macd_line: Vec<f64>,
    pub signal_line: Vec<f64>,
    pub histogram: Vec<f64>,
}

impl MacdResult {
    fn empty() -> Self {
        MacdResult { macd_line: vec![], signal_line: vec![], histogram: vec![] }
    }
}

/// MACD line starts at the slow EMA's warm-up horizon (index `slow - 1`),
/// so all three vectors have `len - slow + 1` values.
pub fn macd(data: &[f64], fast_period: usize, slow_period: usize, signal_period: usize) -> MacdResult {
    if fast_period == 0
        || signal_period == 0
        || slow_period <= fast_period
        || data.len() < slow_period
    {
        return MacdResult::empty();
    }

    let ema_fast = ema(data, fast_period);
    let ema_slow = ema(data, slow_period);

    let macd_line: Vec<f64> = (slow_period - 1..data.len())
        .map(|i| ema_fast[i] - ema_slow[i])
        .collect();

    let signal_line = ema(&macd_line, signal_period);

    let histogram = macd_line
        .iter()
        .zip(&signal_line)
        .map(|(m, s)| m - s)
        .collect();

    MacdResult {
        macd_line,
        signal_line,
        histogram,
    }
}

/// Stochastic Oscillator
pub struct StochasticResult {
    pub k: Vec<f64>,
    pub d: Vec<f64>,
}

pub fn stochastic(bars: &[Bar], k_period: usize, d_period: usize) -> StochasticResult {
    if k_period == 0 || bars.len() < k_period {
        return StochasticResult { k: vec![], d: vec![] };
    }

    let mut k_values = Vec::with_capacity(bars.len() - k_period + 1);

    for i in k_period - 1..bars.len() {
        let slice = &bars[i + 1 - k_period..=i];
        let highest_high = highest(slice.iter().map(|b| b.high));
        let lowest_low = lowest(slice.iter().map(|b| b.low));

        k_values.push(range_position(bars[i].close, lowest_low, highest_high, 50.0));
    }

    let d_values = sma(&k_values, d_period);

    StochasticResult {
        k: k_values,
        d: d_values,
    }
}

/// Williams %R in -100..0; a flat range gives -50.
pub fn williams_r(bars: &[Bar], period: usize) -> Vec<f64> {
    if period == 0 || bars.len() < period {
        return vec![];
    }

    (period - 1..bars.len())
        .map(|i| {
            let slice = &bars[i + 1 - period..=i];
            let highest_high = highest(slice.iter().map(|b| b.high));
            let lowest_low = lowest(slice.iter().map(|b| b.low));
            let range = highest_high - lowest_low;
            if range <= 0.0 {
                -50.0
            } else {
                (highest_high - bars[i].close) / range * -100.0
            }
        })
        .collect()
}

/// Simplified directional-movement index: over each trailing window of
/// `period` bar-to-bar moves, `Σ|+DM - -DM| / ΣTR * 100`.
pub fn adx(bars: &[Bar], period: usize) -> Vec<f64> {
    if period == 0 || bars.len() <= period {
        return vec![];
    }

    let mut dm_spread = Vec::with_capacity(bars.len() - 1);
    let mut true_ranges = Vec::with_capacity(bars.len() - 1);

    for i in 1..bars.len() {
        let up_move = bars[i].high - bars[i - 1].high;
        let down_move = bars[i - 1].low - bars[i].low;

        let plus_dm = if up_move > down_move && up_move > 0.0 { up_move } else { 0.0 };
        let minus_dm = if down_move > up_move && down_move > 0.0 { down_move } else { 0.0 };

        dm_spread.push((plus_dm - minus_dm).abs());
        true_ranges.push(true_range(bars[i].high, bars[i].low, bars[i - 1].close));
    }

    (period..=dm_spread.len())
        .map(|end| {
            let dm_sum: f64 = dm_spread[end - period..end].iter().sum();
            let tr_sum: f64 = true_ranges[end - period..end].iter().sum();
            if tr_sum > 0.0 {
                (dm_sum / tr_sum * 100.0).clamp(0.0, 100.0)
            } else {
                0.0
            }
        })
        .collect()
}

/// RSI of closes. Fewer than `period + 1` bars yields a single neutral
/// point of [`RSI_NEUTRAL`] instead of an empty series.
pub fn compute_rsi(bars: &[Bar], period: usize) -> Result<IndicatorSeries, EngineError> {
    let kind = IndicatorKind::rsi(period);
    let series = prepare(&kind, bars)?;
    let values = rsi(&series.closes(), period);

    let points = if values.is_empty() {
        tracing::debug!("RSI({}) on {} bars: neutral fallback", period, bars.len());
        fallback_point(&series, RSI_NEUTRAL)
    } else {
        tail_aligned(bars, &values)
    };
    Ok(IndicatorSeries::new(kind, points))
}

/// %K in `value`, %D in `signal` (absent until `d_period` %K values exist).
pub fn compute_stochastic(bars: &[Bar], k_period: usize, d_period: usize) -> Result<IndicatorSeries, EngineError> {
    let kind = IndicatorKind::Stochastic { k_period, d_period };
    prepare(&kind, bars)?;
    let result = stochastic(bars, k_period, d_period);

    let mut points = tail_aligned(bars, &result.k);
    let d_offset = points.len().saturating_sub(result.d.len());
    for (point, d) in points[d_offset..].iter_mut().zip(&result.d) {
        point.signal = Some(*d);
    }
    Ok(IndicatorSeries::new(kind, points))
}

pub fn compute_williams_r(bars: &[Bar], period: usize) -> Result<IndicatorSeries, EngineError> {
    let kind = IndicatorKind::WilliamsR { period };
    prepare(&kind, bars)?;
    let values = williams_r(bars, period);
    Ok(IndicatorSeries::new(kind, tail_aligned(bars, &values)))
}

/// MACD line in `value`, plus `signal` and `histogram` on every point.
pub fn compute_macd(bars: &[Bar], fast: usize, slow: usize, signal: usize) -> Result<IndicatorSeries, EngineError> {
    let kind = IndicatorKind::macd(fast, slow, signal);
    let series = prepare(&kind, bars)?;
    let result = macd(&series.closes(), fast, slow, signal);

    let mut points: Vec<IndicatorPoint> = tail_aligned(bars, &result.macd_line);
    for (i, point) in points.iter_mut().enumerate() {
        point.signal = Some(result.signal_line[i]);
        point.histogram = Some(result.histogram[i]);
    }
    Ok(IndicatorSeries::new(kind, points))
}

/// ADX with a single [`ADX_NEUTRAL`] point when data is short.
pub fn compute_adx(bars: &[Bar], period: usize) -> Result<IndicatorSeries, EngineError> {
    let kind = IndicatorKind::Adx { period };
    let series = prepare(&kind, bars)?;
    let values = adx(bars, period);

    let points = if values.is_empty() {
        tracing::debug!("ADX({}) on {} bars: neutral fallback", period, bars.len());
        fallback_point(&series, ADX_NEUTRAL)
    } else {
        tail_aligned(bars, &values)
    };
    Ok(IndicatorSeries::new(kind, points))
}
