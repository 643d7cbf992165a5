use nepse_core::{
    Bar, CompositeScore, Contribution, IndicatorSeries, IndicatorSignal, ScoreComponent, SignalCategory,
    SignalLabel, SignalThresholds, TrendDirection,
};
use serde::Serialize;

/// Indicator outputs the full analysis computes, all ending at the same bar.
#[derive(Debug, Clone, Serialize)]
pub struct IndicatorSet {
    pub sma_short: IndicatorSeries,
    pub sma_long: IndicatorSeries,
    pub ema: IndicatorSeries,
    pub rsi: IndicatorSeries,
    pub stochastic: IndicatorSeries,
    pub williams_r: IndicatorSeries,
    pub macd: IndicatorSeries,
    pub adx: IndicatorSeries,
    pub bollinger: IndicatorSeries,
    pub atr: IndicatorSeries,
    pub obv: IndicatorSeries,
    pub vwap: IndicatorSeries,
    pub volume_sma: IndicatorSeries,
}

fn insufficient(component: ScoreComponent) -> IndicatorSignal {
    IndicatorSignal::new(component, SignalCategory::Neutral, "insufficient data")
}

/// Price against both averages, with crossovers taking precedence.
pub fn moving_average_signal(close: f64, short: &IndicatorSeries, long: &IndicatorSeries) -> IndicatorSignal {
    let component = ScoreComponent::MovingAverages;
    let (Some(s), Some(l)) = (short.latest_value(), long.latest_value()) else {
        return insufficient(component);
    };
    let short_label = short.parameters.label();
    let long_label = long.parameters.label();

    if let (Some(prev_s), Some(prev_l)) = (short.previous(), long.previous()) {
        if s > l && prev_s.value <= prev_l.value {
            return IndicatorSignal::new(
                component,
                SignalCategory::Bullish,
                format!("Golden cross: {short_label} crossed above {long_label}"),
            );
        }
        if s < l && prev_s.value >= prev_l.value {
            return IndicatorSignal::new(
                component,
                SignalCategory::Bearish,
                format!("Death cross: {short_label} crossed below {long_label}"),
            );
        }
    }

    if close > s && close > l {
        IndicatorSignal::new(
            component,
            SignalCategory::Bullish,
            format!("Price above {short_label} and {long_label}"),
        )
    } else if close < s && close < l {
        IndicatorSignal::new(
            component,
            SignalCategory::Bearish,
            format!("Price below {short_label} and {long_label}"),
        )
    } else {
        IndicatorSignal::new(
            component,
            SignalCategory::Neutral,
            format!("Price between {short_label} and {long_label}"),
        )
    }
}

pub fn macd_signal(macd: &IndicatorSeries) -> IndicatorSignal {
    let component = ScoreComponent::Macd;
    let Some(hist) = macd.last().and_then(|p| p.histogram) else {
        return insufficient(component);
    };

    if let Some(prev) = macd.previous().and_then(|p| p.histogram) {
        if hist > 0.0 && prev <= 0.0 {
            return IndicatorSignal::new(component, SignalCategory::Bullish, "MACD bullish crossover");
        }
        if hist < 0.0 && prev >= 0.0 {
            return IndicatorSignal::new(component, SignalCategory::Bearish, "MACD bearish crossover");
        }
    }

    if hist > 0.0 {
        IndicatorSignal::new(component, SignalCategory::Bullish, "MACD above signal line")
    } else if hist < 0.0 {
        IndicatorSignal::new(component, SignalCategory::Bearish, "MACD below signal line")
    } else {
        IndicatorSignal::new(component, SignalCategory::Neutral, "MACD on signal line")
    }
}

pub fn rsi_signal(rsi: &IndicatorSeries, thresholds: &SignalThresholds) -> IndicatorSignal {
    let component = ScoreComponent::Rsi;
    let Some(value) = rsi.latest_value() else {
        return insufficient(component);
    };

    let category = if value > thresholds.rsi_overbought {
        SignalCategory::Overbought
    } else if value < thresholds.rsi_oversold {
        SignalCategory::Oversold
    } else {
        SignalCategory::Neutral
    };
    IndicatorSignal::new(component, category, format!("{} at {:.1}", rsi.parameters.label(), value))
}

/// Close outside the bands reads as stretched, inside as neutral.
pub fn bollinger_signal(close: f64, bollinger: &IndicatorSeries) -> IndicatorSignal {
    let component = ScoreComponent::Bollinger;
    let Some((upper, lower)) = bollinger.last().and_then(|p| Some((p.upper?, p.lower?))) else {
        return insufficient(component);
    };

    if close > upper {
        IndicatorSignal::new(component, SignalCategory::Overbought, "Close above upper band")
    } else if close < lower {
        IndicatorSignal::new(component, SignalCategory::Oversold, "Close below lower band")
    } else {
        IndicatorSignal::new(component, SignalCategory::Neutral, "Close inside the bands")
    }
}

/// Extremes first, then a %K/%D crossover.
pub fn stochastic_signal(stochastic: &IndicatorSeries, thresholds: &SignalThresholds) -> IndicatorSignal {
    let component = ScoreComponent::Stochastic;
    let Some(last) = stochastic.last() else {
        return insufficient(component);
    };
    let k = last.value;

    if k > thresholds.stochastic_overbought {
        return IndicatorSignal::new(component, SignalCategory::Overbought, format!("%K at {k:.1}"));
    }
    if k < thresholds.stochastic_oversold {
        return IndicatorSignal::new(component, SignalCategory::Oversold, format!("%K at {k:.1}"));
    }

    if let (Some(d), Some(prev)) = (last.signal, stochastic.previous()) {
        if let Some(prev_d) = prev.signal {
            if k > d && prev.value <= prev_d {
                return IndicatorSignal::new(component, SignalCategory::Bullish, "%K crossed above %D");
            }
            if k < d && prev.value >= prev_d {
                return IndicatorSignal::new(component, SignalCategory::Bearish, "%K crossed below %D");
            }
        }
    }

    IndicatorSignal::new(component, SignalCategory::Neutral, format!("%K at {k:.1}"))
}

/// ADX grades trend strength; direction comes from the trend assessment.
pub fn adx_signal(adx: &IndicatorSeries, direction: TrendDirection, thresholds: &SignalThresholds) -> IndicatorSignal {
    let component = ScoreComponent::Adx;
    let Some(value) = adx.latest_value() else {
        return insufficient(component);
    };

    if value > thresholds.adx_strong {
        let category = match direction {
            TrendDirection::Bullish => SignalCategory::Bullish,
            TrendDirection::Bearish => SignalCategory::Bearish,
            TrendDirection::Sideways => SignalCategory::StrongTrend,
        };
        IndicatorSignal::new(component, category, format!("Strong trend, ADX {value:.1}"))
    } else if value < thresholds.adx_weak {
        IndicatorSignal::new(component, SignalCategory::WeakTrend, format!("Weak trend, ADX {value:.1}"))
    } else {
        IndicatorSignal::new(component, SignalCategory::Neutral, format!("ADX {value:.1}"))
    }
}

/// Latest volume against its average; heavy volume takes the direction of
/// the last close.
pub fn volume_signal(bars: &[Bar], volume_sma: &IndicatorSeries, thresholds: &SignalThresholds) -> IndicatorSignal {
    let component = ScoreComponent::Volume;
    let (Some(last), Some(average)) = (bars.last(), volume_sma.latest_value()) else {
        return insufficient(component);
    };
    if average <= 0.0 {
        return insufficient(component);
    }

    let ratio = last.volume / average;
    if ratio > thresholds.volume_high_ratio {
        let prev_close = bars.len().checked_sub(2).map(|i| bars[i].close);
        let category = match prev_close {
            Some(prev) if last.close > prev => SignalCategory::Bullish,
            Some(prev) if last.close < prev => SignalCategory::Bearish,
            _ => SignalCategory::High,
        };
        IndicatorSignal::new(component, category, format!("Volume {ratio:.1}x average"))
    } else if ratio < thresholds.volume_low_ratio {
        IndicatorSignal::new(component, SignalCategory::Low, format!("Volume {ratio:.1}x average"))
    } else {
        IndicatorSignal::new(component, SignalCategory::Neutral, format!("Volume {ratio:.1}x average"))
    }
}

/// One signal per scoring component, in [`ScoreComponent::ALL`] order.
pub fn derive_signals(
    bars: &[Bar],
    set: &IndicatorSet,
    direction: TrendDirection,
    thresholds: &SignalThresholds,
) -> Vec<IndicatorSignal> {
    let Some(close) = bars.last().map(|b| b.close) else {
        return ScoreComponent::ALL.iter().map(|&c| insufficient(c)).collect();
    };

    vec![
        moving_average_signal(close, &set.sma_short, &set.sma_long),
        macd_signal(&set.macd),
        rsi_signal(&set.rsi, thresholds),
        bollinger_signal(close, &set.bollinger),
        stochastic_signal(&set.stochastic, thresholds),
        adx_signal(&set.adx, direction, thresholds),
        volume_signal(bars, &set.volume_sma, thresholds),
    ]
}

/// Weighted mean of directional values scaled to -100..100. The denominator
/// is the weight of the components actually supplied; no input scores 0.
pub fn score_composite(signals: &[IndicatorSignal]) -> CompositeScore {
    let contributions: Vec<Contribution> = signals
        .iter()
        .map(|s| Contribution {
            indicator_name: s.component.name().to_string(),
            weight: s.component.weight(),
            directional_value: s.signal.directional_value(),
        })
        .collect();

    let total_weight: f64 = contributions.iter().map(|c| c.weight).sum();
    let weighted: f64 = contributions.iter().map(|c| c.weight * c.directional_value).sum();

    let score = if total_weight > 0.0 {
        (weighted / total_weight * 100.0).clamp(-100.0, 100.0)
    } else {
        0.0
    };

    let reasoning = signals
        .iter()
        .map(|s| {
            let value = s.signal.directional_value();
            let sign = if value > 0.0 {
                "+"
            } else if value < 0.0 {
                "-"
            } else {
                "~"
            };
            format!("{} {}: {}", sign, s.component.name(), s.reason)
        })
        .collect();

    CompositeScore {
        score,
        label: SignalLabel::from_score(score),
        contributions,
        reasoning,
    }
}
