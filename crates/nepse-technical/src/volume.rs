use nepse_core::{Bar, EngineError, IndicatorKind, IndicatorSeries};

use crate::moving_average::sma;
use crate::{prepare, tail_aligned};

/// On-Balance Volume
pub fn obv(bars: &[Bar]) -> Vec<f64> {
    if bars.is_empty() {
        return vec![];
    }

    let mut obv_values = Vec::with_capacity(bars.len());
    obv_values.push(bars[0].volume);

    for i in 1..bars.len() {
        let prev_obv = obv_values[i - 1];
        let new_obv = if bars[i].close > bars[i - 1].close {
            prev_obv + bars[i].volume
        } else if bars[i].close < bars[i - 1].close {
            prev_obv - bars[i].volume
        } else {
            prev_obv
        };
        obv_values.push(new_obv);
    }

    obv_values
}

/// Volume-Weighted Average Price
pub fn vwap(bars: &[Bar]) -> Vec<f64> {
    let mut vwap_values = Vec::with_capacity(bars.len());
    let mut cumulative_tpv = 0.0;
    let mut cumulative_volume = 0.0;

    for bar in bars {
        let typical_price = (bar.high + bar.low + bar.close) / 3.0;
        cumulative_tpv += typical_price * bar.volume;
        cumulative_volume += bar.volume;

        let vwap = if cumulative_volume > 0.0 {
            cumulative_tpv / cumulative_volume
        } else {
            typical_price
        };

        vwap_values.push(vwap);
    }

    vwap_values
}

/// Latest volume relative to its trailing average, `None` until the
/// average exists or when it is zero.
pub fn volume_ratio(bars: &[Bar], period: usize) -> Option<f64> {
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();
    let average = *sma(&volumes, period).last()?;
    let last = bars.last()?.volume;
    (average > 0.0).then(|| last / average)
}

pub fn compute_obv(bars: &[Bar]) -> Result<IndicatorSeries, EngineError> {
    let kind = IndicatorKind::Obv;
    prepare(&kind, bars)?;
    Ok(IndicatorSeries::new(kind, tail_aligned(bars, &obv(bars))))
}

pub fn compute_vwap(bars: &[Bar]) -> Result<IndicatorSeries, EngineError> {
    let kind = IndicatorKind::Vwap;
    prepare(&kind, bars)?;
    Ok(IndicatorSeries::new(kind, tail_aligned(bars, &vwap(bars))))
}

/// SMA of volume; empty when `period` exceeds the series, like SMA.
pub fn compute_volume_sma(bars: &[Bar], period: usize) -> Result<IndicatorSeries, EngineError> {
    let kind = IndicatorKind::VolumeSma { period };
    let series = prepare(&kind, bars)?;
    let values = sma(&series.volumes(), period);
    Ok(IndicatorSeries::new(kind, tail_aligned(bars, &values)))
}
