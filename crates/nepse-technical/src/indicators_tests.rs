#[cfg(test)]
mod tests {
    use crate::engine::compute;
    use crate::moving_average::*;
    use crate::oscillators::*;
    use crate::test_support::*;
    use crate::trend::{analyze_trend, nearest_levels};
    use crate::volatility::*;
    use approx::assert_abs_diff_eq;
    use nepse_core::{Bar, EngineError, IndicatorKind, NearestLevels, TrendDirection, TrendStrength};

    // Daily closes of a mid-cap bank over one month
    fn sample_prices() -> Vec<f64> {
        vec![
            512.0, 508.5, 510.2, 505.0, 511.8, 518.3, 521.0, 524.6, 529.9, 532.1,
            530.0, 531.7, 526.4, 534.2, 534.2, 530.8, 531.1, 535.9, 533.6, 526.7,
            522.3, 519.0, 523.8, 528.4, 531.0, 537.2, 541.5, 539.9, 544.0, 548.3,
        ]
    }

    fn sample_bars() -> Vec<Bar> {
        bars_from_closes(&sample_prices())
    }

    fn every_kind() -> Vec<IndicatorKind> {
        vec![
            IndicatorKind::sma(5),
            IndicatorKind::ema(10),
            IndicatorKind::rsi(14),
            IndicatorKind::Stochastic { k_period: 14, d_period: 3 },
            IndicatorKind::WilliamsR { period: 14 },
            IndicatorKind::macd(12, 26, 3),
            IndicatorKind::Adx { period: 14 },
            IndicatorKind::bollinger(20, 2.0),
            IndicatorKind::Atr { period: 14 },
            IndicatorKind::Obv,
            IndicatorKind::Vwap,
            IndicatorKind::VolumeSma { period: 10 },
        ]
    }

    #[test]
    fn test_sma_end_to_end() {
        let bars = bars_from_closes(&[100.0, 102.0, 101.0, 105.0, 108.0]);
        let result = compute(&IndicatorKind::sma(3), &bars).unwrap();

        assert_eq!(result.len(), 3);
        assert_abs_diff_eq!(result.points[0].value, 101.0, epsilon = 1e-3);
        assert_abs_diff_eq!(result.points[1].value, 102.667, epsilon = 1e-3);
        assert_abs_diff_eq!(result.points[2].value, 104.667, epsilon = 1e-3);
        assert_eq!(result.points[0].timestamp, bars[2].timestamp);
    }

    #[test]
    fn test_sma_constant_prices() {
        for period in [1, 5, 20, 30] {
            let bars = bars_from_closes(&[250.0; 30]);
            let result = compute(&IndicatorKind::sma(period), &bars).unwrap();
            assert_eq!(result.len(), 30 - period + 1);
            assert!(result.values().iter().all(|&v| v == 250.0));
        }
    }

    #[test]
    fn test_ema_lags_rising_market() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + 1.5 * i as f64).collect();
        let result = ema(&closes, 10);
        assert_eq!(result.len(), closes.len());
        for (value, close) in result.iter().zip(&closes) {
            assert!(value <= close);
        }
    }

    #[test]
    fn test_rsi_bounds() {
        let inputs = [
            sample_prices(),
            wavy_closes(60, 100.0, 0.0),
            wavy_closes(60, 300.0, -2.0),
            (0..30).map(|i| 100.0 + i as f64).collect(),
            (0..30).map(|i| 100.0 - i as f64).collect(),
        ];
        for closes in inputs {
            for value in rsi(&closes, 14) {
                assert!((0.0..=100.0).contains(&value));
            }
        }
    }

    #[test]
    fn test_bollinger_ordering() {
        let bars = sample_bars();
        let result = compute(&IndicatorKind::bollinger(10, 2.0), &bars).unwrap();
        assert!(!result.is_empty());
        for p in &result.points {
            let (upper, middle, lower) = (p.upper.unwrap(), p.middle.unwrap(), p.lower.unwrap());
            assert!(lower <= middle && middle <= upper);
        }
    }

    #[test]
    fn test_macd_histogram_identity() {
        let bars = bars_from_closes(&wavy_closes(90, 100.0, 0.3));
        let result = compute(&IndicatorKind::macd(12, 26, 9), &bars).unwrap();
        assert_eq!(result.len(), 90 - 26 + 1);
        for p in &result.points {
            let expected = p.value - p.signal.unwrap();
            assert_abs_diff_eq!(p.histogram.unwrap(), expected, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_compute_is_deterministic() {
        let bars = sample_bars();
        for kind in every_kind() {
            let first = compute(&kind, &bars).unwrap();
            let second = compute(&kind, &bars).unwrap();
            assert_eq!(first, second, "{} differs between runs", kind.label());
        }
    }

    #[test]
    fn test_insufficient_data_policies_differ() {
        let bars = bars_from_closes(&[100.0, 101.0, 102.0, 103.0, 104.0]);

        // SMA: empty series
        assert!(compute(&IndicatorKind::sma(10), &bars).unwrap().is_empty());

        // RSI: single neutral point, not an error
        let rsi = compute(&IndicatorKind::rsi(14), &bars).unwrap();
        assert_eq!(rsi.values(), vec![50.0]);

        // ADX: single neutral point
        let adx = compute(&IndicatorKind::Adx { period: 14 }, &bars).unwrap();
        assert_eq!(adx.values(), vec![25.0]);

        // The rest follow SMA
        for kind in [
            IndicatorKind::ema(10),
            IndicatorKind::bollinger(20, 2.0),
            IndicatorKind::Atr { period: 14 },
            IndicatorKind::Stochastic { k_period: 14, d_period: 3 },
            IndicatorKind::WilliamsR { period: 14 },
            IndicatorKind::macd(12, 26, 9),
            IndicatorKind::VolumeSma { period: 20 },
        ] {
            let result = compute(&kind, &bars).unwrap();
            if kind == IndicatorKind::ema(10) {
                // EMA is seeded with the first close and never warms up
                assert_eq!(result.len(), bars.len());
            } else {
                assert!(result.is_empty(), "{} should be empty", kind.label());
            }
        }
    }

    #[test]
    fn test_empty_input_is_always_an_error() {
        for kind in every_kind() {
            assert_eq!(compute(&kind, &[]).unwrap_err(), EngineError::EmptySeries);
        }
    }

    #[test]
    fn test_malformed_series_rejected() {
        let mut bars = sample_bars();
        bars.swap(3, 4);
        assert_eq!(
            compute(&IndicatorKind::sma(5), &bars).unwrap_err(),
            EngineError::NonMonotonicTimestamps { index: 3 }
        );

        let mut bars = sample_bars();
        bars[7].high = bars[7].low - 1.0;
        assert!(matches!(
            compute(&IndicatorKind::rsi(14), &bars),
            Err(EngineError::InvalidBar { index: 7, .. })
        ));
    }

    #[test]
    fn test_output_length_follows_warmup() {
        let bars = sample_bars();
        let last = bars.last().unwrap().timestamp;
        for kind in every_kind() {
            let result = compute(&kind, &bars).unwrap();
            assert_eq!(result.len(), bars.len() - kind.warmup_bars(), "{}", kind.label());
            assert_eq!(result.last().unwrap().timestamp, last, "{}", kind.label());
        }
    }

    #[test]
    fn test_flat_series_trend() {
        let bars = bars_from_closes(&[100.0; 30]);
        let trend = analyze_trend(&bars);
        assert_eq!(trend.direction, TrendDirection::Sideways);
        assert_eq!(trend.strength, TrendStrength::Weak);
        assert_abs_diff_eq!(trend.confidence, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_stochastic_and_williams_agree() {
        // %R = %K - 100 over the same window
        let bars = sample_bars();
        let k = stochastic(&bars, 14, 3).k;
        let r = williams_r(&bars, 14);
        assert_eq!(k.len(), r.len());
        for (k, r) in k.iter().zip(&r) {
            assert_abs_diff_eq!(*r, k - 100.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_atr_non_negative() {
        let bars = sample_bars();
        assert!(atr(&bars, 14).iter().all(|&v| v >= 0.0));
        assert!(adx(&bars, 14).iter().all(|&v| (0.0..=100.0).contains(&v)));
    }

    #[test]
    fn test_huge_periods_fall_back_without_overflow() {
        let bars = sample_bars();

        let rsi = compute(&IndicatorKind::rsi(usize::MAX), &bars).unwrap();
        assert_eq!(rsi.values(), vec![50.0]);

        let adx = compute(&IndicatorKind::Adx { period: usize::MAX }, &bars).unwrap();
        assert_eq!(adx.values(), vec![25.0]);

        assert!(compute(&IndicatorKind::Atr { period: usize::MAX }, &bars).unwrap().is_empty());
        assert_eq!(nearest_levels(&bars, usize::MAX), NearestLevels::default());
    }
}
