//! Numeric helpers shared by every indicator.
//!
//! All functions are total: empty input returns a neutral value instead of
//! NaN so callers never have to special-case an empty window.

/// Compute the mean of a data slice.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Population standard deviation (divides by `n`, not `n - 1`).
pub fn population_std_dev(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let m = mean(data);
    let variance = data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / data.len() as f64;
    variance.sqrt()
}

/// Largest value in the slice, `f64::NEG_INFINITY` when empty.
pub fn highest(data: impl IntoIterator<Item = f64>) -> f64 {
    data.into_iter().fold(f64::NEG_INFINITY, f64::max)
}

/// Smallest value in the slice, `f64::INFINITY` when empty.
pub fn lowest(data: impl IntoIterator<Item = f64>) -> f64 {
    data.into_iter().fold(f64::INFINITY, f64::min)
}

/// Relative change from `from` to `to` as a fraction (0.05 = +5%).
/// Returns 0.0 when `from` is zero.
pub fn relative_change(from: f64, to: f64) -> f64 {
    if from == 0.0 {
        return 0.0;
    }
    (to - from) / from
}

/// Position of `value` inside `[low, high]` scaled to 0..100.
/// A flat range returns `flat` instead of dividing by zero.
pub fn range_position(value: f64, low: f64, high: f64, flat: f64) -> f64 {
    let range = high - low;
    if range <= 0.0 {
        return flat;
    }
    (value - low) / range * 100.0
}

/// True range of a bar given the previous close.
pub fn true_range(high: f64, low: f64, prev_close: f64) -> f64 {
    let high_low = high - low;
    let high_close = (high - prev_close).abs();
    let low_close = (low - prev_close).abs();
    high_low.max(high_close).max(low_close)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean_and_empty() {
        assert_relative_eq!(mean(&[1.0, 2.0, 3.0, 4.0]), 2.5);
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn test_population_std_dev() {
        // Classic example: population sd of 2,4,4,4,5,5,7,9 is exactly 2
        let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(population_std_dev(&data), 2.0, epsilon = 1e-12);
        assert_eq!(population_std_dev(&[42.0]), 0.0);
    }

    #[test]
    fn test_extremes() {
        let data = [3.0, -1.0, 7.5, 2.0];
        assert_eq!(highest(data.iter().copied()), 7.5);
        assert_eq!(lowest(data.iter().copied()), -1.0);
        assert_eq!(highest(std::iter::empty()), f64::NEG_INFINITY);
    }

    #[test]
    fn test_relative_change() {
        assert_relative_eq!(relative_change(100.0, 110.0), 0.1, epsilon = 1e-12);
        assert_eq!(relative_change(0.0, 10.0), 0.0);
    }

    #[test]
    fn test_range_position_flat_guard() {
        assert_relative_eq!(range_position(15.0, 10.0, 20.0, 50.0), 50.0);
        assert_relative_eq!(range_position(20.0, 10.0, 20.0, 50.0), 100.0);
        assert_eq!(range_position(10.0, 10.0, 10.0, 50.0), 50.0);
    }

    #[test]
    fn test_true_range_uses_gap() {
        // Gap up: previous close far below today's low
        assert_relative_eq!(true_range(110.0, 105.0, 100.0), 10.0);
        assert_relative_eq!(true_range(110.0, 105.0, 107.0), 5.0);
    }
}
