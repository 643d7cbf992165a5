use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::error::EngineError;

/// Levels at which oscillator readings turn into signals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalThresholds {
    pub rsi_overbought: f64,         // 70
    pub rsi_oversold: f64,           // 30
    pub stochastic_overbought: f64,  // 80
    pub stochastic_oversold: f64,    // 20
    pub adx_strong: f64,             // 25
    pub adx_weak: f64,               // 20
    pub volume_high_ratio: f64,      // 1.5x average
    pub volume_low_ratio: f64,       // 0.5x average
}

impl Default for SignalThresholds {
    fn default() -> Self {
        Self {
            rsi_overbought: 70.0,
            rsi_oversold: 30.0,
            stochastic_overbought: 80.0,
            stochastic_oversold: 20.0,
            adx_strong: 25.0,
            adx_weak: 20.0,
            volume_high_ratio: 1.5,
            volume_low_ratio: 0.5,
        }
    }
}

/// Default indicator parameters used by the full analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    // Moving averages
    pub sma_short: usize,            // 20
    pub sma_long: usize,             // 50
    pub ema_period: usize,           // 20

    // Oscillators
    pub rsi_period: usize,           // 14
    pub stochastic_k: usize,         // 14
    pub stochastic_d: usize,         // 3
    pub williams_period: usize,      // 14
    pub macd_fast: usize,            // 12
    pub macd_slow: usize,            // 26
    pub macd_signal: usize,          // 9
    pub adx_period: usize,           // 14

    // Volatility
    pub bollinger_period: usize,     // 20
    pub bollinger_deviation: f64,    // 2.0
    pub atr_period: usize,           // 14

    // Volume
    pub volume_period: usize,        // 20

    // Windows
    pub min_bars: usize,             // 50
    pub trend_lookback: usize,       // 60
    pub level_lookback: usize,       // 60
    pub pivot_lookback: usize,       // 30

    pub thresholds: SignalThresholds,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sma_short: 20,
            sma_long: 50,
            ema_period: 20,
            rsi_period: 14,
            stochastic_k: 14,
            stochastic_d: 3,
            williams_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            adx_period: 14,
            bollinger_period: 20,
            bollinger_deviation: 2.0,
            atr_period: 14,
            volume_period: 20,
            min_bars: 50,
            trend_lookback: 60,
            level_lookback: 60,
            pivot_lookback: 30,
            thresholds: SignalThresholds::default(),
        }
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {key}: {raw:?}")),
        _ => Ok(default),
    }
}

impl EngineConfig {
    /// Load overrides from `TA_*` environment variables (and `.env`).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let d = Self::default();
        let t = d.thresholds;
        let config = Self {
            sma_short: env_or("TA_SMA_SHORT", d.sma_short)?,
            sma_long: env_or("TA_SMA_LONG", d.sma_long)?,
            ema_period: env_or("TA_EMA_PERIOD", d.ema_period)?,
            rsi_period: env_or("TA_RSI_PERIOD", d.rsi_period)?,
            stochastic_k: env_or("TA_STOCHASTIC_K", d.stochastic_k)?,
            stochastic_d: env_or("TA_STOCHASTIC_D", d.stochastic_d)?,
            williams_period: env_or("TA_WILLIAMS_PERIOD", d.williams_period)?,
            macd_fast: env_or("TA_MACD_FAST", d.macd_fast)?,
            macd_slow: env_or("TA_MACD_SLOW", d.macd_slow)?,
            macd_signal: env_or("TA_MACD_SIGNAL", d.macd_signal)?,
            adx_period: env_or("TA_ADX_PERIOD", d.adx_period)?,
            bollinger_period: env_or("TA_BOLLINGER_PERIOD", d.bollinger_period)?,
            bollinger_deviation: env_or("TA_BOLLINGER_DEVIATION", d.bollinger_deviation)?,
            atr_period: env_or("TA_ATR_PERIOD", d.atr_period)?,
            volume_period: env_or("TA_VOLUME_PERIOD", d.volume_period)?,
            min_bars: env_or("TA_MIN_BARS", d.min_bars)?,
            trend_lookback: env_or("TA_TREND_LOOKBACK", d.trend_lookback)?,
            level_lookback: env_or("TA_LEVEL_LOOKBACK", d.level_lookback)?,
            pivot_lookback: env_or("TA_PIVOT_LOOKBACK", d.pivot_lookback)?,
            thresholds: SignalThresholds {
                rsi_overbought: env_or("TA_RSI_OVERBOUGHT", t.rsi_overbought)?,
                rsi_oversold: env_or("TA_RSI_OVERSOLD", t.rsi_oversold)?,
                stochastic_overbought: env_or("TA_STOCHASTIC_OVERBOUGHT", t.stochastic_overbought)?,
                stochastic_oversold: env_or("TA_STOCHASTIC_OVERSOLD", t.stochastic_oversold)?,
                adx_strong: env_or("TA_ADX_STRONG", t.adx_strong)?,
                adx_weak: env_or("TA_ADX_WEAK", t.adx_weak)?,
                volume_high_ratio: env_or("TA_VOLUME_HIGH_RATIO", t.volume_high_ratio)?,
                volume_low_ratio: env_or("TA_VOLUME_LOW_RATIO", t.volume_low_ratio)?,
            },
        };

        config.validate().context("Engine configuration rejected")?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        let periods = [
            ("sma_short", self.sma_short),
            ("sma_long", self.sma_long),
            ("ema_period", self.ema_period),
            ("rsi_period", self.rsi_period),
            ("stochastic_k", self.stochastic_k),
            ("stochastic_d", self.stochastic_d),
            ("williams_period", self.williams_period),
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
            ("adx_period", self.adx_period),
            ("bollinger_period", self.bollinger_period),
            ("atr_period", self.atr_period),
            ("volume_period", self.volume_period),
            ("trend_lookback", self.trend_lookback),
            ("level_lookback", self.level_lookback),
            ("pivot_lookback", self.pivot_lookback),
        ];
        if let Some((name, _)) = periods.iter().find(|(_, p)| *p == 0) {
            return Err(EngineError::InvalidParameters(format!("{name} must be > 0")));
        }

        if self.sma_short >= self.sma_long {
            return Err(EngineError::InvalidParameters(format!(
                "sma_short ({}) must be shorter than sma_long ({})",
                self.sma_short, self.sma_long
            )));
        }
        if self.macd_fast >= self.macd_slow {
            return Err(EngineError::InvalidParameters(format!(
                "macd_fast ({}) must be shorter than macd_slow ({})",
                self.macd_fast, self.macd_slow
            )));
        }
        if !self.bollinger_deviation.is_finite() || self.bollinger_deviation < 0.0 {
            return Err(EngineError::InvalidParameters(format!(
                "bollinger_deviation must be finite and non-negative, got {}",
                self.bollinger_deviation
            )));
        }

        let t = &self.thresholds;
        if t.rsi_oversold >= t.rsi_overbought {
            return Err(EngineError::InvalidParameters(
                "rsi_oversold must be below rsi_overbought".to_string(),
            ));
        }
        if t.stochastic_oversold >= t.stochastic_overbought {
            return Err(EngineError::InvalidParameters(
                "stochastic_oversold must be below stochastic_overbought".to_string(),
            ));
        }
        if t.adx_weak > t.adx_strong {
            return Err(EngineError::InvalidParameters(
                "adx_weak must not exceed adx_strong".to_string(),
            ));
        }
        if t.volume_low_ratio >= t.volume_high_ratio {
            return Err(EngineError::InvalidParameters(
                "volume_low_ratio must be below volume_high_ratio".to_string(),
            ));
        }

        Ok(())
    }
}
