use nepse_core::stats::{population_std_dev, true_range};
use nepse_core::{Bar, EngineError, IndicatorKind, IndicatorSeries};

use crate::moving_average::sma;
use crate::{prepare, tail_aligned};

/// Bollinger Bands
pub struct BollingerBands {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

/// Bands around an SMA at `deviation` population standard deviations.
/// `lower <= middle <= upper` holds for any non-negative deviation.
pub fn bollinger_bands(data: &[f64], period: usize, deviation: f64) -> BollingerBands {
    if period == 0 || data.len() < period {
        return BollingerBands { upper: vec![], middle: vec![], lower: vec![] };
    }

    let middle = sma(data, period);
    let mut upper = Vec::with_capacity(middle.len());
    let mut lower = Vec::with_capacity(middle.len());

    for (start, &mean) in middle.iter().enumerate() {
        let std = population_std_dev(&data[start..start + period]);
        upper.push(mean + deviation * std);
        lower.push(mean - deviation * std);
    }

    BollingerBands {
        upper,
        middle,
        lower,
    }
}

/// True range per bar from index 1 (index 0 has no previous close).
pub fn true_ranges(bars: &[Bar]) -> Vec<f64> {
    bars.windows(2)
        .map(|w| true_range(w[1].high, w[1].low, w[0].close))
        .collect()
}

/// Average True Range as a plain SMA of true range.
pub fn atr(bars: &[Bar], period: usize) -> Vec<f64> {
    if period == 0 || bars.len() <= period {
        return vec![];
    }
    sma(&true_ranges(bars), period)
}

/// Middle band in `value`, all three bands in `upper`/`middle`/`lower`.
pub fn compute_bollinger(bars: &[Bar], period: usize, deviation: f64) -> Result<IndicatorSeries, EngineError> {
    let kind = IndicatorKind::bollinger(period, deviation);
    let series = prepare(&kind, bars)?;
    let bands = bollinger_bands(&series.closes(), period, deviation);

    let mut points = tail_aligned(bars, &bands.middle);
    for (i, point) in points.iter_mut().enumerate() {
        point.upper = Some(bands.upper[i]);
        point.middle = Some(bands.middle[i]);
        point.lower = Some(bands.lower[i]);
    }
    Ok(IndicatorSeries::new(kind, points))
}

pub fn compute_atr(bars: &[Bar], period: usize) -> Result<IndicatorSeries, EngineError> {
    let kind = IndicatorKind::Atr { period };
    prepare(&kind, bars)?;
    let values = atr(bars, period);
    Ok(IndicatorSeries::new(kind, tail_aligned(bars, &values)))
}
