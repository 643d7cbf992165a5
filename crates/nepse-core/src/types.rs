use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// OHLCV bar data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Where an indicator is plotted relative to price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorCategory {
    Overlay,
    Oscillator,
    Volume,
}

/// Every indicator the engine knows how to compute, with its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IndicatorKind {
    Sma { period: usize },
    Ema { period: usize },
    Rsi { period: usize },
    Stochastic { k_period: usize, d_period: usize },
    WilliamsR { period: usize },
    Macd { fast: usize, slow: usize, signal: usize },
    Adx { period: usize },
    Bollinger { period: usize, deviation: f64 },
    Atr { period: usize },
    Obv,
    Vwap,
    VolumeSma { period: usize },
}

impl IndicatorKind {
    pub const fn sma(period: usize) -> Self {
        IndicatorKind::Sma { period }
    }

    pub const fn ema(period: usize) -> Self {
        IndicatorKind::Ema { period }
    }

    pub const fn rsi(period: usize) -> Self {
        IndicatorKind::Rsi { period }
    }

    pub const fn macd(fast: usize, slow: usize, signal: usize) -> Self {
        IndicatorKind::Macd { fast, slow, signal }
    }

    pub const fn bollinger(period: usize, deviation: f64) -> Self {
        IndicatorKind::Bollinger { period, deviation }
    }

    /// Short indicator name without parameters.
    pub fn name(&self) -> &'static str {
        match self {
            IndicatorKind::Sma { .. } => "SMA",
            IndicatorKind::Ema { .. } => "EMA",
            IndicatorKind::Rsi { .. } => "RSI",
            IndicatorKind::Stochastic { .. } => "Stochastic",
            IndicatorKind::WilliamsR { .. } => "Williams %R",
            IndicatorKind::Macd { .. } => "MACD",
            IndicatorKind::Adx { .. } => "ADX",
            IndicatorKind::Bollinger { .. } => "Bollinger Bands",
            IndicatorKind::Atr { .. } => "ATR",
            IndicatorKind::Obv => "OBV",
            IndicatorKind::Vwap => "VWAP",
            IndicatorKind::VolumeSma { .. } => "Volume SMA",
        }
    }

    /// Name with every parameter, unique per parameter set.
    pub fn label(&self) -> String {
        match self {
            IndicatorKind::Sma { period } => format!("SMA({period})"),
            IndicatorKind::Ema { period } => format!("EMA({period})"),
            IndicatorKind::Rsi { period } => format!("RSI({period})"),
            IndicatorKind::Stochastic { k_period, d_period } => {
                format!("Stochastic({k_period},{d_period})")
            }
            IndicatorKind::WilliamsR { period } => format!("Williams %R({period})"),
            IndicatorKind::Macd { fast, slow, signal } => format!("MACD({fast},{slow},{signal})"),
            IndicatorKind::Adx { period } => format!("ADX({period})"),
            IndicatorKind::Bollinger { period, deviation } => format!("BB({period},{deviation})"),
            IndicatorKind::Atr { period } => format!("ATR({period})"),
            IndicatorKind::Obv => "OBV".to_string(),
            IndicatorKind::Vwap => "VWAP".to_string(),
            IndicatorKind::VolumeSma { period } => format!("Volume SMA({period})"),
        }
    }

    pub fn category(&self) -> IndicatorCategory {
        match self {
            IndicatorKind::Sma { .. }
            | IndicatorKind::Ema { .. }
            | IndicatorKind::Bollinger { .. }
            | IndicatorKind::Vwap => IndicatorCategory::Overlay,
            IndicatorKind::Rsi { .. }
            | IndicatorKind::Stochastic { .. }
            | IndicatorKind::WilliamsR { .. }
            | IndicatorKind::Macd { .. }
            | IndicatorKind::Adx { .. }
            | IndicatorKind::Atr { .. } => IndicatorCategory::Oscillator,
            IndicatorKind::Obv | IndicatorKind::VolumeSma { .. } => IndicatorCategory::Volume,
        }
    }

    /// Bars consumed before the first regular point is produced.
    pub fn warmup_bars(&self) -> usize {
        match *self {
            IndicatorKind::Sma { period }
            | IndicatorKind::Bollinger { period, .. }
            | IndicatorKind::WilliamsR { period }
            | IndicatorKind::VolumeSma { period } => period.saturating_sub(1),
            IndicatorKind::Stochastic { k_period, .. } => k_period.saturating_sub(1),
            IndicatorKind::Rsi { period } | IndicatorKind::Adx { period } | IndicatorKind::Atr { period } => {
                period
            }
            IndicatorKind::Macd { slow, .. } => slow.saturating_sub(1),
            IndicatorKind::Ema { .. } | IndicatorKind::Obv | IndicatorKind::Vwap => 0,
        }
    }

    /// Reject parameter sets no indicator can be computed with.
    pub fn validate(&self) -> Result<(), EngineError> {
        let zero = |what: &str| Err(EngineError::InvalidParameters(format!("{what} must be > 0")));
        match *self {
            IndicatorKind::Sma { period }
            | IndicatorKind::Ema { period }
            | IndicatorKind::Rsi { period }
            | IndicatorKind::WilliamsR { period }
            | IndicatorKind::Adx { period }
            | IndicatorKind::Atr { period }
            | IndicatorKind::VolumeSma { period } => {
                if period == 0 {
                    return zero("period");
                }
            }
            IndicatorKind::Stochastic { k_period, d_period } => {
                if k_period == 0 {
                    return zero("k_period");
                }
                if d_period == 0 {
                    return zero("d_period");
                }
            }
            IndicatorKind::Macd { fast, slow, signal } => {
                if fast == 0 || slow == 0 || signal == 0 {
                    return zero("MACD periods");
                }
                if fast >= slow {
                    return Err(EngineError::InvalidParameters(format!(
                        "MACD fast period ({fast}) must be shorter than slow period ({slow})"
                    )));
                }
            }
            IndicatorKind::Bollinger { period, deviation } => {
                if period == 0 {
                    return zero("period");
                }
                if !deviation.is_finite() || deviation < 0.0 {
                    return Err(EngineError::InvalidParameters(format!(
                        "Bollinger deviation must be finite and non-negative, got {deviation}"
                    )));
                }
            }
            IndicatorKind::Obv | IndicatorKind::Vwap => {}
        }
        Ok(())
    }
}

/// One computed sample aligned to a source bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    /// MACD signal line, or Stochastic %D
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub histogram: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower: Option<f64>,
}

impl IndicatorPoint {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self {
            timestamp,
            value,
            signal: None,
            histogram: None,
            upper: None,
            middle: None,
            lower: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSeries {
    pub name: String,
    pub category: IndicatorCategory,
    pub parameters: IndicatorKind,
    pub points: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub fn new(kind: IndicatorKind, points: Vec<IndicatorPoint>) -> Self {
        Self {
            name: kind.name().to_string(),
            category: kind.category(),
            parameters: kind,
            points,
        }
    }

    /// Series with no points: "not yet computable".
    pub fn empty(kind: IndicatorKind) -> Self {
        Self::new(kind, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&IndicatorPoint> {
        self.points.last()
    }

    /// Second-to-last point, used for crossover checks.
    pub fn previous(&self) -> Option<&IndicatorPoint> {
        self.points.len().checked_sub(2).map(|i| &self.points[i])
    }

    pub fn latest_value(&self) -> Option<f64> {
        self.points.last().map(|p| p.value)
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Bullish,
    Bearish,
    Sideways,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendStrength {
    Strong,
    Moderate,
    Weak,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendAssessment {
    pub direction: TrendDirection,
    pub strength: TrendStrength,
    /// 0 to 100
    pub confidence: f64,
}

impl TrendAssessment {
    /// Result used whenever there is too little data to judge.
    pub const fn undetermined() -> Self {
        Self {
            direction: TrendDirection::Sideways,
            strength: TrendStrength::Weak,
            confidence: 0.0,
        }
    }
}

/// Up to three support and three resistance prices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelSet {
    pub support: Vec<f64>,
    pub resistance: Vec<f64>,
}

/// Closest swing levels around the last close.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NearestLevels {
    pub support: Option<f64>,
    pub resistance: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandlestickPattern {
    Doji,
    Hammer,
    InvertedHammer,
    ShootingStar,
    Engulfing,
    Piercing,
    DarkCloudCover,
    MorningStar,
    EveningStar,
    ThreeWhiteSoldiers,
    ThreeBlackCrows,
}

impl CandlestickPattern {
    pub fn label(&self) -> &'static str {
        match self {
            CandlestickPattern::Doji => "Doji",
            CandlestickPattern::Hammer => "Hammer",
            CandlestickPattern::InvertedHammer => "Inverted Hammer",
            CandlestickPattern::ShootingStar => "Shooting Star",
            CandlestickPattern::Engulfing => "Engulfing",
            CandlestickPattern::Piercing => "Piercing",
            CandlestickPattern::DarkCloudCover => "Dark Cloud Cover",
            CandlestickPattern::MorningStar => "Morning Star",
            CandlestickPattern::EveningStar => "Evening Star",
            CandlestickPattern::ThreeWhiteSoldiers => "Three White Soldiers",
            CandlestickPattern::ThreeBlackCrows => "Three Black Crows",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternMatch {
    pub pattern: CandlestickPattern,
    pub index: usize,
    pub strength: f64, // 0.0 to 1.0
    pub bullish: bool,
}

/// Categorical reading an indicator contributes to the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalCategory {
    Bullish,
    Bearish,
    Overbought,
    Oversold,
    Neutral,
    StrongTrend,
    WeakTrend,
    High,
    Low,
}

impl SignalCategory {
    /// Directional value in -1..=1.
    pub fn directional_value(&self) -> f64 {
        match self {
            SignalCategory::Bullish => 1.0,
            SignalCategory::Bearish => -1.0,
            SignalCategory::Overbought => -0.5,
            SignalCategory::Oversold => 0.5,
            SignalCategory::Neutral
            | SignalCategory::StrongTrend
            | SignalCategory::WeakTrend
            | SignalCategory::High
            | SignalCategory::Low => 0.0,
        }
    }
}

/// Indicator families that carry a fixed weight in the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScoreComponent {
    MovingAverages,
    Macd,
    Rsi,
    Bollinger,
    Stochastic,
    Adx,
    Volume,
}

impl ScoreComponent {
    pub const ALL: [ScoreComponent; 7] = [
        ScoreComponent::MovingAverages,
        ScoreComponent::Macd,
        ScoreComponent::Rsi,
        ScoreComponent::Bollinger,
        ScoreComponent::Stochastic,
        ScoreComponent::Adx,
        ScoreComponent::Volume,
    ];

    /// Importance weight; the weights of all components sum to 100.
    pub fn weight(&self) -> f64 {
        match self {
            ScoreComponent::MovingAverages => 25.0,
            ScoreComponent::Macd => 20.0,
            ScoreComponent::Rsi => 15.0,
            ScoreComponent::Bollinger => 15.0,
            ScoreComponent::Stochastic => 10.0,
            ScoreComponent::Adx => 10.0,
            ScoreComponent::Volume => 5.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScoreComponent::MovingAverages => "Moving Averages",
            ScoreComponent::Macd => "MACD",
            ScoreComponent::Rsi => "RSI",
            ScoreComponent::Bollinger => "Bollinger Bands",
            ScoreComponent::Stochastic => "Stochastic",
            ScoreComponent::Adx => "ADX",
            ScoreComponent::Volume => "Volume",
        }
    }
}

/// One scorer input: which family, what it says, and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSignal {
    pub component: ScoreComponent,
    pub signal: SignalCategory,
    pub reason: String,
}

impl IndicatorSignal {
    pub fn new(component: ScoreComponent, signal: SignalCategory, reason: impl Into<String>) -> Self {
        Self {
            component,
            signal,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub indicator_name: String,
    pub weight: f64,
    pub directional_value: f64,
}

/// Discrete recommendation derived from the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalLabel {
    #[serde(rename = "Strong Buy")]
    StrongBuy,
    Buy,
    Hold,
    Sell,
    #[serde(rename = "Strong Sell")]
    StrongSell,
}

impl SignalLabel {
    /// Total mapping from a -100..100 score to a label.
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s > 60.0 => SignalLabel::StrongBuy,
            s if s > 20.0 => SignalLabel::Buy,
            s if s > -20.0 => SignalLabel::Hold,
            s if s > -60.0 => SignalLabel::Sell,
            _ => SignalLabel::StrongSell,
        }
    }

    /// Human-readable label for the signal
    pub fn to_label(&self) -> &'static str {
        match self {
            SignalLabel::StrongBuy => "Strong Buy",
            SignalLabel::Buy => "Buy",
            SignalLabel::Hold => "Hold",
            SignalLabel::Sell => "Sell",
            SignalLabel::StrongSell => "Strong Sell",
        }
    }
}

impl std::fmt::Display for SignalLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeScore {
    /// -100 to 100
    pub score: f64,
    pub label: SignalLabel,
    pub contributions: Vec<Contribution>,
    pub reasoning: Vec<String>,
}

/// Full technical picture of one instrument at its latest bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalReport {
    pub symbol: String,
    /// Timestamp of the last bar analyzed
    pub as_of: DateTime<Utc>,
    pub last_close: f64,
    pub bars_analyzed: usize,
    pub trend: TrendAssessment,
    pub levels: LevelSet,
    pub nearest: NearestLevels,
    pub patterns: Vec<PatternMatch>,
    pub signals: Vec<IndicatorSignal>,
    pub composite: CompositeScore,
    pub metrics: serde_json::Value,
}
