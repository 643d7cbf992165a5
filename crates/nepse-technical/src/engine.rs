use nepse_core::{
    validate, Bar, EngineConfig, EngineError, IndicatorKind, IndicatorSeries, LevelSet, NearestLevels,
    PatternMatch, TechnicalAnalyzer, TechnicalReport, TrendAssessment,
};
use rayon::prelude::*;
use serde_json::json;

use crate::moving_average::{compute_ema, compute_sma};
use crate::oscillators::{compute_adx, compute_macd, compute_rsi, compute_stochastic, compute_williams_r};
use crate::patterns::detect_patterns;
use crate::scoring::{derive_signals, score_composite, IndicatorSet};
use crate::trend::{analyze_trend, find_support_resistance, nearest_levels};
use crate::volatility::{compute_atr, compute_bollinger};
use crate::volume::{compute_obv, compute_volume_sma, compute_vwap, volume_ratio};

/// Single entry point for every indicator.
pub fn compute(kind: &IndicatorKind, bars: &[Bar]) -> Result<IndicatorSeries, EngineError> {
    match *kind {
        IndicatorKind::Sma { period } => compute_sma(bars, period),
        IndicatorKind::Ema { period } => compute_ema(bars, period),
        IndicatorKind::Rsi { period } => compute_rsi(bars, period),
        IndicatorKind::Stochastic { k_period, d_period } => compute_stochastic(bars, k_period, d_period),
        IndicatorKind::WilliamsR { period } => compute_williams_r(bars, period),
        IndicatorKind::Macd { fast, slow, signal } => compute_macd(bars, fast, slow, signal),
        IndicatorKind::Adx { period } => compute_adx(bars, period),
        IndicatorKind::Bollinger { period, deviation } => compute_bollinger(bars, period, deviation),
        IndicatorKind::Atr { period } => compute_atr(bars, period),
        IndicatorKind::Obv => compute_obv(bars),
        IndicatorKind::Vwap => compute_vwap(bars),
        IndicatorKind::VolumeSma { period } => compute_volume_sma(bars, period),
    }
}

/// Compute several indicators over the same bars in parallel. Results keep
/// the order of `kinds`.
pub fn compute_batch(kinds: &[IndicatorKind], bars: &[Bar]) -> Vec<Result<IndicatorSeries, EngineError>> {
    kinds.par_iter().map(|kind| compute(kind, bars)).collect()
}

pub struct TechnicalAnalysisEngine {
    config: EngineConfig,
}

impl TechnicalAnalysisEngine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Every indicator the full analysis reads, with the configured parameters.
    pub fn compute_indicator_set(&self, bars: &[Bar]) -> Result<IndicatorSet, EngineError> {
        let c = &self.config;
        Ok(IndicatorSet {
            sma_short: compute_sma(bars, c.sma_short)?,
            sma_long: compute_sma(bars, c.sma_long)?,
            ema: compute_ema(bars, c.ema_period)?,
            rsi: compute_rsi(bars, c.rsi_period)?,
            stochastic: compute_stochastic(bars, c.stochastic_k, c.stochastic_d)?,
            williams_r: compute_williams_r(bars, c.williams_period)?,
            macd: compute_macd(bars, c.macd_fast, c.macd_slow, c.macd_signal)?,
            adx: compute_adx(bars, c.adx_period)?,
            bollinger: compute_bollinger(bars, c.bollinger_period, c.bollinger_deviation)?,
            atr: compute_atr(bars, c.atr_period)?,
            obv: compute_obv(bars)?,
            vwap: compute_vwap(bars)?,
            volume_sma: compute_volume_sma(bars, c.volume_period)?,
        })
    }

    /// Full technical picture at the last bar.
    ///
    /// Fails with `InsufficientData` below `min_bars`. The report is stamped
    /// with the last bar's timestamp, so identical input gives an identical
    /// report.
    pub fn analyze(&self, symbol: &str, bars: &[Bar]) -> Result<TechnicalReport, EngineError> {
        let series = validate(bars, self.config.min_bars)?;
        let last = series.last();

        let set = self.compute_indicator_set(bars)?;
        let trend = analyze_trend(series.tail(self.config.trend_lookback));
        let levels = find_support_resistance(series.tail(self.config.level_lookback));
        let nearest = nearest_levels(bars, self.config.pivot_lookback);
        let patterns = detect_patterns(bars);

        let signals = derive_signals(bars, &set, trend.direction, &self.config.thresholds);
        let composite = score_composite(&signals);

        tracing::debug!(
            "{}: {} bars, trend {:?}/{:?}, {} patterns",
            symbol,
            bars.len(),
            trend.direction,
            trend.strength,
            patterns.len()
        );
        tracing::info!("Technical analysis for {}: {} ({:.1})", symbol, composite.label, composite.score);

        let metrics = self.build_metrics(bars, &set, &trend, &levels, &nearest, &patterns);

        Ok(TechnicalReport {
            symbol: symbol.to_string(),
            as_of: last.timestamp,
            last_close: last.close,
            bars_analyzed: bars.len(),
            trend,
            levels,
            nearest,
            patterns,
            signals,
            composite,
            metrics,
        })
    }

    /// Latest value of every indicator plus derived band and volume ratios.
    fn build_metrics(
        &self,
        bars: &[Bar],
        set: &IndicatorSet,
        trend: &TrendAssessment,
        levels: &LevelSet,
        nearest: &NearestLevels,
        patterns: &[PatternMatch],
    ) -> serde_json::Value {
        let close = bars.last().map(|b| b.close);

        let bands = set.bollinger.last().and_then(|p| Some((p.upper?, p.middle?, p.lower?)));
        let (bb_width, bb_percent_b) = match (bands, close) {
            (Some((upper, middle, lower)), Some(price)) => {
                let width = if middle != 0.0 { (upper - lower) / middle } else { 0.0 };
                let percent_b = if upper - lower != 0.0 { (price - lower) / (upper - lower) } else { 0.5 };
                (Some(width), Some(percent_b))
            }
            _ => (None, None),
        };

        let detected_patterns: Vec<serde_json::Value> = patterns
            .iter()
            .map(|p| {
                json!({
                    "name": p.pattern.label(),
                    "index": p.index,
                    "strength": p.strength,
                    "bullish": p.bullish,
                })
            })
            .collect();

        let macd = set.macd.last();
        let stochastic = set.stochastic.last();

        json!({
            "sma_short": set.sma_short.latest_value(),
            "sma_long": set.sma_long.latest_value(),
            "ema": set.ema.latest_value(),
            "rsi": set.rsi.latest_value(),
            "stochastic_k": stochastic.map(|p| p.value),
            "stochastic_d": stochastic.and_then(|p| p.signal),
            "williams_r": set.williams_r.latest_value(),
            "macd": macd.map(|p| p.value),
            "macd_signal": macd.and_then(|p| p.signal),
            "macd_histogram": macd.and_then(|p| p.histogram),
            "adx": set.adx.latest_value(),
            "bb_upper": bands.map(|b| b.0),
            "bb_middle": bands.map(|b| b.1),
            "bb_lower": bands.map(|b| b.2),
            "bb_width": bb_width,
            "bb_percent_b": bb_percent_b,
            "atr": set.atr.latest_value(),
            "obv": set.obv.latest_value(),
            "vwap": set.vwap.latest_value(),
            "volume_ratio": volume_ratio(bars, self.config.volume_period),
            "trend": trend.direction,
            "trend_confidence": trend.confidence,
            "support_levels": levels.support,
            "resistance_levels": levels.resistance,
            "support": nearest.support,
            "resistance": nearest.resistance,
            "patterns": patterns.len(),
            "detected_patterns": detected_patterns,
        })
    }
}

impl Default for TechnicalAnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TechnicalAnalyzer for TechnicalAnalysisEngine {
    fn compute(&self, kind: &IndicatorKind, bars: &[Bar]) -> Result<IndicatorSeries, EngineError> {
        compute(kind, bars)
    }

    fn analyze(&self, symbol: &str, bars: &[Bar]) -> Result<TechnicalReport, EngineError> {
        TechnicalAnalysisEngine::analyze(self, symbol, bars)
    }
}
