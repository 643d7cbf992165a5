use nepse_core::{Bar, EngineError, IndicatorKind, IndicatorSeries};

use crate::{prepare, tail_aligned};

/// Simple Moving Average
pub fn sma(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return vec![];
    }

    let mut result = Vec::with_capacity(data.len() - period + 1);
    for i in period - 1..data.len() {
        let sum: f64 = data[i + 1 - period..=i].iter().sum();
        result.push(sum / period as f64);
    }
    result
}

/// Exponential Moving Average, seeded with the first value (no SMA seed),
/// so the output is as long as the input.
pub fn ema(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.is_empty() {
        return vec![];
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut result = Vec::with_capacity(data.len());
    result.push(data[0]);

    for i in 1..data.len() {
        let ema_val = data[i] * k + result[i - 1] * (1.0 - k);
        result.push(ema_val);
    }

    result
}

/// SMA of closes. Empty (not an error) when `period` exceeds the series.
pub fn compute_sma(bars: &[Bar], period: usize) -> Result<IndicatorSeries, EngineError> {
    let kind = IndicatorKind::sma(period);
    let series = prepare(&kind, bars)?;
    let values = sma(&series.closes(), period);
    Ok(IndicatorSeries::new(kind, tail_aligned(bars, &values)))
}

/// EMA of closes, one point per bar.
pub fn compute_ema(bars: &[Bar], period: usize) -> Result<IndicatorSeries, EngineError> {
    let kind = IndicatorKind::ema(period);
    let series = prepare(&kind, bars)?;
    let values = ema(&series.closes(), period);
    Ok(IndicatorSeries::new(kind, tail_aligned(bars, &values)))
}
