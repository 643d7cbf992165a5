pub mod engine;
pub mod moving_average;
pub mod oscillators;
pub mod patterns;
pub mod scoring;
pub mod trend;
pub mod volatility;
pub mod volume;

#[cfg(test)]
mod indicators_tests;
#[cfg(test)]
mod test_support;

pub use engine::*;
pub use moving_average::*;
pub use oscillators::*;
pub use patterns::*;
pub use scoring::*;
pub use trend::*;
pub use volatility::*;
pub use volume::*;

use nepse_core::{validate, Bar, EngineError, IndicatorKind, IndicatorPoint, ValidSeries};

/// Check parameters, then the series. Every `compute_*` entry point runs this
/// first, so an empty series is always `EmptySeries`.
pub(crate) fn prepare<'a>(kind: &IndicatorKind, bars: &'a [Bar]) -> Result<ValidSeries<'a>, EngineError> {
    kind.validate()?;
    validate(bars, 1)
}

/// Pair `values` with the timestamps of the bars they end on. Every indicator
/// output ends at the last bar, so the offset is whatever precedes it.
pub(crate) fn tail_aligned(bars: &[Bar], values: &[f64]) -> Vec<IndicatorPoint> {
    let offset = bars.len().saturating_sub(values.len());
    bars[offset..]
        .iter()
        .zip(values)
        .map(|(bar, &value)| IndicatorPoint::new(bar.timestamp, value))
        .collect()
}

/// Single sentinel point stamped with the last bar.
pub(crate) fn fallback_point(series: &ValidSeries<'_>, value: f64) -> Vec<IndicatorPoint> {
    vec![IndicatorPoint::new(series.last().timestamp, value)]
}
