use chrono::{DateTime, Duration, TimeZone, Utc};
use nepse_core::Bar;

pub fn day(i: usize) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(i as i64)
}

pub fn bar(i: usize, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Bar {
    Bar {
        timestamp: day(i),
        open,
        high,
        low,
        close,
        volume,
    }
}

/// Bars whose open is the previous close and whose range brackets both.
pub fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            bar(i, open, open.max(close) + 1.0, open.min(close) - 1.0, close, 1_000_000.0)
        })
        .collect()
}

/// Deterministic zig-zag walk with drift, enough bars for every indicator.
pub fn wavy_closes(n: usize, start: f64, drift: f64) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let wave = ((i as f64) * 0.7).sin() * 3.0 + ((i as f64) * 0.23).cos() * 1.5;
            start + drift * i as f64 + wave
        })
        .collect()
}
