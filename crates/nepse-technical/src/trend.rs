use nepse_core::stats::{mean, relative_change};
use nepse_core::{Bar, LevelSet, NearestLevels, TrendAssessment, TrendDirection, TrendStrength};

/// Windows shorter than this are reported as undetermined.
pub const MIN_TREND_BARS: usize = 20;

/// Relative change between half-means that flips the direction (5%).
const DIRECTION_THRESHOLD: f64 = 0.05;
const STRONG_THRESHOLD: f64 = 0.10;

/// Confidence points per percent of change; 20% reaches 100.
const CONFIDENCE_SCALE: f64 = 5.0;

/// Minimum relative gap between two reported levels on the same side.
const LEVEL_MIN_DISTANCE: f64 = 0.02;
const MAX_LEVELS: usize = 3;

/// Compare the mean close of the second half of the window with the first.
pub fn analyze_trend(window: &[Bar]) -> TrendAssessment {
    if window.len() < MIN_TREND_BARS {
        return TrendAssessment::undetermined();
    }

    let closes: Vec<f64> = window.iter().map(|b| b.close).collect();
    let (first, second) = closes.split_at(closes.len() / 2);
    let first_mean = mean(first);
    let second_mean = mean(second);

    if first_mean <= 0.0 {
        return TrendAssessment::undetermined();
    }

    let direction = if second_mean > first_mean * (1.0 + DIRECTION_THRESHOLD) {
        TrendDirection::Bullish
    } else if second_mean < first_mean * (1.0 - DIRECTION_THRESHOLD) {
        TrendDirection::Bearish
    } else {
        TrendDirection::Sideways
    };

    let change = relative_change(first_mean, second_mean).abs();
    let strength = if change > STRONG_THRESHOLD {
        TrendStrength::Strong
    } else if change > DIRECTION_THRESHOLD {
        TrendStrength::Moderate
    } else {
        TrendStrength::Weak
    };

    TrendAssessment {
        direction,
        strength,
        confidence: (change * 100.0 * CONFIDENCE_SCALE).min(100.0),
    }
}

/// Up to three supports (lowest lows first) and three resistances (highest
/// highs first), skipping candidates within 2% of an accepted level.
pub fn find_support_resistance(window: &[Bar]) -> LevelSet {
    let mut lows: Vec<f64> = window.iter().map(|b| b.low).collect();
    lows.sort_by(f64::total_cmp);

    let mut highs: Vec<f64> = window.iter().map(|b| b.high).collect();
    highs.sort_by(|a, b| b.total_cmp(a));

    LevelSet {
        support: distinct_levels(&lows),
        resistance: distinct_levels(&highs),
    }
}

fn distinct_levels(sorted: &[f64]) -> Vec<f64> {
    let mut accepted: Vec<f64> = Vec::with_capacity(MAX_LEVELS);
    for &candidate in sorted {
        if accepted.len() == MAX_LEVELS {
            break;
        }
        if accepted.iter().all(|&level| is_distinct(candidate, level)) {
            accepted.push(candidate);
        }
    }
    accepted
}

fn is_distinct(candidate: f64, level: f64) -> bool {
    if level == 0.0 {
        return candidate != 0.0;
    }
    ((candidate - level) / level).abs() > LEVEL_MIN_DISTANCE
}

/// Nearest swing levels around the last close, from local extremes with
/// two-bar confirmation on each side.
pub fn nearest_levels(bars: &[Bar], lookback: usize) -> NearestLevels {
    if lookback < 5 || lookback > bars.len().saturating_sub(2) {
        return NearestLevels::default();
    }
    let Some(last) = bars.last() else {
        return NearestLevels::default();
    };

    let recent = &bars[bars.len() - lookback..];
    let mut swing_highs: Vec<f64> = Vec::new();
    let mut swing_lows: Vec<f64> = Vec::new();

    for i in 2..recent.len() - 2 {
        let neighbours = [i - 2, i - 1, i + 1, i + 2];
        if neighbours.iter().all(|&j| recent[i].high > recent[j].high) {
            swing_highs.push(recent[i].high);
        }
        if neighbours.iter().all(|&j| recent[i].low < recent[j].low) {
            swing_lows.push(recent[i].low);
        }
    }

    let current_price = last.close;

    // Nearest resistance = lowest swing high above current price
    let resistance = swing_highs
        .iter()
        .filter(|&&h| h > current_price)
        .copied()
        .reduce(f64::min);

    // Nearest support = highest swing low below current price
    let support = swing_lows
        .iter()
        .filter(|&&l| l < current_price)
        .copied()
        .reduce(f64::max);

    NearestLevels { support, resistance }
}
