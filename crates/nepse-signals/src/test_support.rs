use chrono::{DateTime, Duration, TimeZone, Utc};
use nepse_core::{Bar, EngineError, IndicatorKind, IndicatorSeries, TechnicalAnalyzer, TechnicalReport};
use nepse_technical::TechnicalAnalysisEngine;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn day(i: usize) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(i as i64)
}

pub fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: day(i),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1_000_000.0,
            }
        })
        .collect()
}

pub fn rising_bars(n: usize) -> Vec<Bar> {
    let closes: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
    bars_from_closes(&closes)
}

pub fn falling_bars(n: usize) -> Vec<Bar> {
    let closes: Vec<f64> = (0..n).map(|i| 200.0 - i as f64).collect();
    bars_from_closes(&closes)
}

/// Real engine that counts how often it is reached.
#[derive(Default)]
pub struct CountingAnalyzer {
    engine: TechnicalAnalysisEngine,
    compute_calls: AtomicUsize,
    analyze_calls: AtomicUsize,
}

impl CountingAnalyzer {
    pub fn compute_calls(&self) -> usize {
        self.compute_calls.load(Ordering::SeqCst)
    }

    pub fn analyze_calls(&self) -> usize {
        self.analyze_calls.load(Ordering::SeqCst)
    }
}

impl TechnicalAnalyzer for CountingAnalyzer {
    fn compute(&self, kind: &IndicatorKind, bars: &[Bar]) -> Result<IndicatorSeries, EngineError> {
        self.compute_calls.fetch_add(1, Ordering::SeqCst);
        TechnicalAnalyzer::compute(&self.engine, kind, bars)
    }

    fn analyze(&self, symbol: &str, bars: &[Bar]) -> Result<TechnicalReport, EngineError> {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        self.engine.analyze(symbol, bars)
    }
}
