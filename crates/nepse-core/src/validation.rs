use crate::error::EngineError;
use crate::types::Bar;

/// A series that passed [`validate`]: non-empty, strictly ascending
/// timestamps, every bar internally consistent.
#[derive(Debug, Clone, Copy)]
pub struct ValidSeries<'a> {
    bars: &'a [Bar],
}

impl<'a> ValidSeries<'a> {
    pub fn bars(&self) -> &'a [Bar] {
        self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }

    pub fn last(&self) -> &'a Bar {
        // validate() guarantees at least one bar
        &self.bars[self.bars.len() - 1]
    }

    /// Trailing window of at most `lookback` bars.
    pub fn tail(&self, lookback: usize) -> &'a [Bar] {
        &self.bars[self.bars.len().saturating_sub(lookback)..]
    }
}

/// Check a series before any indicator touches it.
///
/// Checks run in a fixed order: emptiness, length, timestamp ordering, then
/// per-bar consistency. The first failure is returned.
pub fn validate(bars: &[Bar], min_length: usize) -> Result<ValidSeries<'_>, EngineError> {
    if bars.is_empty() {
        tracing::debug!("Rejected empty series");
        return Err(EngineError::EmptySeries);
    }

    if bars.len() < min_length {
        tracing::debug!("Rejected series: {} bars, {} required", bars.len(), min_length);
        return Err(EngineError::InsufficientData {
            required: min_length,
            actual: bars.len(),
        });
    }

    if let Some(index) = bars
        .windows(2)
        .position(|w| w[0].timestamp >= w[1].timestamp)
    {
        tracing::debug!("Rejected series: timestamp at {} is not before {}", index, index + 1);
        return Err(EngineError::NonMonotonicTimestamps { index });
    }

    for (index, bar) in bars.iter().enumerate() {
        if let Some(reason) = bar_defect(bar) {
            tracing::debug!("Rejected series: bar {} {}", index, reason);
            return Err(EngineError::InvalidBar { index, reason });
        }
    }

    Ok(ValidSeries { bars })
}

fn bar_defect(bar: &Bar) -> Option<String> {
    let fields = [
        ("open", bar.open),
        ("high", bar.high),
        ("low", bar.low),
        ("close", bar.close),
        ("volume", bar.volume),
    ];

    for (name, value) in fields {
        if !value.is_finite() {
            return Some(format!("{name} is not finite"));
        }
        if value < 0.0 {
            return Some(format!("{name} is negative ({value})"));
        }
    }

    if bar.low > bar.open.min(bar.close) {
        return Some(format!(
            "low {} is above min(open, close) {}",
            bar.low,
            bar.open.min(bar.close)
        ));
    }
    if bar.high < bar.open.max(bar.close) {
        return Some(format!(
            "high {} is below max(open, close) {}",
            bar.high,
            bar.open.max(bar.close)
        ));
    }

    None
}
