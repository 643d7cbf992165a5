use nepse_core::{Bar, CandlestickPattern, PatternMatch};

/// Body and shadow measurements of a single candle.
struct Candle {
    body: f64,
    range: f64,
    upper_shadow: f64,
    lower_shadow: f64,
    bullish: bool,
    bearish: bool,
}

impl Candle {
    fn of(bar: &Bar) -> Self {
        Self {
            body: (bar.close - bar.open).abs(),
            range: bar.high - bar.low,
            upper_shadow: bar.high - bar.open.max(bar.close),
            lower_shadow: bar.open.min(bar.close) - bar.low,
            bullish: bar.close > bar.open,
            bearish: bar.close < bar.open,
        }
    }

    fn small_body(&self) -> bool {
        self.range > 0.0 && self.body / self.range < 0.3
    }
}

fn matched(pattern: CandlestickPattern, index: usize, strength: f64, bullish: bool) -> PatternMatch {
    PatternMatch {
        pattern,
        index,
        strength: strength.clamp(0.0, 1.0),
        bullish,
    }
}

/// Shadow-to-body ratio mapped to 0..1, saturating at 5x.
fn shadow_strength(shadow: f64, body: f64) -> f64 {
    if body <= 0.0 {
        return 1.0;
    }
    (shadow / body).min(5.0) / 5.0
}

/// Net direction of the closes leading into `index` (up to three bars back).
fn prior_move(bars: &[Bar], index: usize) -> f64 {
    let start = index.saturating_sub(3);
    if start == index {
        return 0.0;
    }
    bars[index - 1].close - bars[start].close
}

fn doji(bar: &Bar) -> bool {
    let c = Candle::of(bar);
    c.range > 0.0 && c.body / c.range < 0.1
}

/// Small body, long lower shadow, little or no upper shadow.
fn hammer(bar: &Bar, index: usize) -> Option<PatternMatch> {
    let c = Candle::of(bar);
    if c.small_body() && c.lower_shadow > 2.0 * c.body && c.upper_shadow < c.body * 0.5 {
        return Some(matched(
            CandlestickPattern::Hammer,
            index,
            shadow_strength(c.lower_shadow, c.body),
            true,
        ));
    }
    None
}

/// Small body with a long upper shadow: an inverted hammer after a decline,
/// a shooting star after an advance.
fn long_upper_shadow(bars: &[Bar], index: usize) -> Option<PatternMatch> {
    let c = Candle::of(&bars[index]);
    if !(c.small_body() && c.upper_shadow > 2.0 * c.body && c.lower_shadow < c.body * 0.5) {
        return None;
    }

    let strength = shadow_strength(c.upper_shadow, c.body);
    let prior = prior_move(bars, index);
    if prior < 0.0 {
        Some(matched(CandlestickPattern::InvertedHammer, index, strength, true))
    } else if prior > 0.0 {
        Some(matched(CandlestickPattern::ShootingStar, index, strength, false))
    } else {
        None
    }
}

fn engulfing(prev: &Bar, curr: &Bar, index: usize) -> Option<PatternMatch> {
    let p = Candle::of(prev);
    let c = Candle::of(curr);

    // Bullish engulfing: prev bearish, curr bullish and engulfs prev
    if p.bearish && c.bullish && curr.open <= prev.close && curr.close >= prev.open {
        return Some(matched(
            CandlestickPattern::Engulfing,
            index,
            (c.body / p.body).min(2.0) / 2.0,
            true,
        ));
    }

    // Bearish engulfing: prev bullish, curr bearish and engulfs prev
    if p.bullish && c.bearish && curr.open >= prev.close && curr.close <= prev.open {
        return Some(matched(
            CandlestickPattern::Engulfing,
            index,
            (c.body / p.body).min(2.0) / 2.0,
            false,
        ));
    }

    None
}

/// Bullish reversal: opens below the prior low, closes above the prior midpoint.
fn piercing(prev: &Bar, curr: &Bar, index: usize) -> Option<PatternMatch> {
    let p = Candle::of(prev);
    let c = Candle::of(curr);
    if !(p.bearish && c.bullish) {
        return None;
    }

    let prev_midpoint = (prev.open + prev.close) / 2.0;
    if curr.open < prev.low && curr.close > prev_midpoint && curr.close < prev.open {
        let penetration = (curr.close - prev.close) / (prev.open - prev.close);
        return Some(matched(CandlestickPattern::Piercing, index, penetration, true));
    }
    None
}

/// Bearish reversal: opens above the prior high, closes below the prior midpoint.
fn dark_cloud_cover(prev: &Bar, curr: &Bar, index: usize) -> Option<PatternMatch> {
    let p = Candle::of(prev);
    let c = Candle::of(curr);
    if !(p.bullish && c.bearish) {
        return None;
    }

    let prev_midpoint = (prev.open + prev.close) / 2.0;
    if curr.open > prev.high && curr.close < prev_midpoint && curr.close > prev.open {
        let penetration = (prev.close - curr.close) / (prev.close - prev.open);
        return Some(matched(CandlestickPattern::DarkCloudCover, index, penetration, false));
    }
    None
}

/// Morning star (bullish) or evening star (bearish): a large candle, a
/// small-bodied star, then a large opposite candle past the first midpoint.
fn star(first: &Bar, middle: &Bar, third: &Bar, index: usize) -> Option<PatternMatch> {
    let f = Candle::of(first);
    let s = Candle::of(middle);
    let t = Candle::of(third);
    if f.range <= 0.0 || s.body >= f.body * 0.3 {
        return None;
    }

    let first_midpoint = (first.open + first.close) / 2.0;
    if f.bearish && t.bullish && third.close > first_midpoint {
        return Some(matched(CandlestickPattern::MorningStar, index, 0.8, true));
    }
    if f.bullish && t.bearish && third.close < first_midpoint {
        return Some(matched(CandlestickPattern::EveningStar, index, 0.8, false));
    }
    None
}

/// Three white soldiers / three black crows: three same-colour candles,
/// each closing beyond the last and opening inside the previous body.
fn three_in_a_row(last_3: &[Bar], index: usize) -> Option<PatternMatch> {
    let [a, b, c] = last_3 else {
        return None;
    };

    if last_3.iter().all(|bar| bar.close > bar.open)
        && b.close > a.close
        && c.close > b.close
        && b.open > a.open
        && b.open < a.close
        && c.open > b.open
        && c.open < b.close
    {
        return Some(matched(CandlestickPattern::ThreeWhiteSoldiers, index, 0.8, true));
    }

    if last_3.iter().all(|bar| bar.close < bar.open)
        && b.close < a.close
        && c.close < b.close
        && b.open < a.open
        && b.open > a.close
        && c.open < b.open
        && c.open > b.close
    {
        return Some(matched(CandlestickPattern::ThreeBlackCrows, index, 0.8, false));
    }

    None
}

/// Detect all patterns that complete on the last bar
pub fn detect_patterns(bars: &[Bar]) -> Vec<PatternMatch> {
    let mut patterns = Vec::new();

    let Some(last) = bars.last() else {
        return patterns;
    };
    let index = bars.len() - 1;

    // Single candle patterns on the last bar
    if doji(last) {
        patterns.push(matched(CandlestickPattern::Doji, index, 0.5, false));
    }
    patterns.extend(hammer(last, index));
    patterns.extend(long_upper_shadow(bars, index));

    // Multi-candle patterns
    if let [.., prev, curr] = bars {
        patterns.extend(engulfing(prev, curr, index));
        patterns.extend(piercing(prev, curr, index));
        patterns.extend(dark_cloud_cover(prev, curr, index));
    }
    if let [.., first, middle, third] = bars {
        patterns.extend(star(first, middle, third, index));
        patterns.extend(three_in_a_row(&bars[index - 2..], index));
    }

    patterns
}
