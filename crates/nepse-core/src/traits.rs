use crate::{Bar, EngineError, IndicatorKind, IndicatorSeries, TechnicalReport};

/// Seam between the pure indicator engine and the collaborators that wrap it
/// (caching, persistence, alerting).
///
/// Implementations must be pure: the same input always yields the same output
/// and nothing is retained between calls.
pub trait TechnicalAnalyzer: Send + Sync {
    fn compute(&self, kind: &IndicatorKind, bars: &[Bar]) -> Result<IndicatorSeries, EngineError>;

    fn analyze(&self, symbol: &str, bars: &[Bar]) -> Result<TechnicalReport, EngineError>;
}
