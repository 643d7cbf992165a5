use chrono::{DateTime, Utc};
use dashmap::DashMap;
use nepse_core::{Bar, EngineError, IndicatorKind, IndicatorSeries, TechnicalAnalyzer, TechnicalReport};
use serde::Serialize;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::ServiceConfig;
use crate::store::normalize_symbol;

/// Internal cache entry with timestamp
struct CacheEntry<T> {
    data: T,
    cached_at: DateTime<Utc>,
    /// Insertion order, used to pick the oldest entry when the cache is full
    sequence: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ComputeKey {
    symbol: String,
    indicator: String,
    last_timestamp: DateTime<Utc>,
    len: usize,
    fingerprint: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ReportKey {
    symbol: String,
    last_timestamp: DateTime<Utc>,
    len: usize,
    fingerprint: u64,
}

/// Hash of every bar's timestamp and OHLCV bits; a revised bar changes it.
fn fingerprint(bars: &[Bar]) -> u64 {
    let mut hasher = DefaultHasher::new();
    for bar in bars {
        bar.timestamp.hash(&mut hasher);
        for value in [bar.open, bar.high, bar.low, bar.close, bar.volume] {
            value.to_bits().hash(&mut hasher);
        }
    }
    hasher.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Memoizing decorator around a [`TechnicalAnalyzer`].
///
/// Results are keyed by symbol and the identity of the series (last bar
/// timestamp, length and a content fingerprint), so a new or revised bar is
/// always a miss. Errors are never cached.
pub struct CachedAnalyzer<A> {
    inner: A,
    ttl_secs: i64,
    max_entries: usize,
    series_cache: DashMap<ComputeKey, CacheEntry<IndicatorSeries>>,
    report_cache: DashMap<ReportKey, CacheEntry<TechnicalReport>>,
    sequence: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<A: TechnicalAnalyzer> CachedAnalyzer<A> {
    pub fn new(inner: A, ttl_secs: i64, max_entries: usize) -> Self {
        Self {
            inner,
            ttl_secs,
            max_entries: max_entries.max(1),
            series_cache: DashMap::new(),
            report_cache: DashMap::new(),
            sequence: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn from_config(inner: A, config: &ServiceConfig) -> Self {
        Self::new(inner, config.cache_ttl_secs, config.cache_max_entries)
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    /// Cached indicator computation (keyed by `kind.label()`).
    pub fn compute(&self, symbol: &str, kind: &IndicatorKind, bars: &[Bar]) -> Result<IndicatorSeries, EngineError> {
        let Some(last) = bars.last() else {
            return self.inner.compute(kind, bars);
        };
        let key = ComputeKey {
            symbol: normalize_symbol(symbol),
            indicator: kind.label(),
            last_timestamp: last.timestamp,
            len: bars.len(),
            fingerprint: fingerprint(bars),
        };

        if let Some(series) = self.lookup(&self.series_cache, &key) {
            return Ok(series);
        }

        let series = self.inner.compute(kind, bars)?;
        self.store(&self.series_cache, key, series.clone());
        Ok(series)
    }

    /// Cached full analysis.
    pub fn analyze(&self, symbol: &str, bars: &[Bar]) -> Result<TechnicalReport, EngineError> {
        let Some(last) = bars.last() else {
            return self.inner.analyze(symbol, bars);
        };
        let key = ReportKey {
            symbol: normalize_symbol(symbol),
            last_timestamp: last.timestamp,
            len: bars.len(),
            fingerprint: fingerprint(bars),
        };

        if let Some(report) = self.lookup(&self.report_cache, &key) {
            return Ok(report);
        }

        let report = self.inner.analyze(symbol, bars)?;
        self.store(&self.report_cache, key, report.clone());
        Ok(report)
    }

    /// Drop every cached result for `symbol`.
    pub fn invalidate(&self, symbol: &str) {
        let symbol = normalize_symbol(symbol);
        self.series_cache.retain(|k, _| k.symbol != symbol);
        self.report_cache.retain(|k, _| k.symbol != symbol);
        tracing::debug!("Invalidated cache for {}", symbol);
    }

    pub fn clear(&self) {
        self.series_cache.clear();
        self.report_cache.clear();
    }

    /// Remove entries older than the TTL from both caches.
    pub fn purge_expired(&self) {
        let now = Utc::now();
        self.series_cache.retain(|_, e| self.is_fresh(e, now));
        self.report_cache.retain(|_, e| self.is_fresh(e, now));
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.series_cache.len() + self.report_cache.len(),
        }
    }

    fn is_fresh<T>(&self, entry: &CacheEntry<T>, now: DateTime<Utc>) -> bool {
        (now - entry.cached_at).num_seconds() < self.ttl_secs
    }

    fn lookup<K, T>(&self, cache: &DashMap<K, CacheEntry<T>>, key: &K) -> Option<T>
    where
        K: Eq + Hash,
        T: Clone,
    {
        let hit = cache
            .get(key)
            .filter(|entry| self.is_fresh(entry.value(), Utc::now()))
            .map(|entry| entry.data.clone());

        if hit.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        hit
    }

    fn store<K, T>(&self, cache: &DashMap<K, CacheEntry<T>>, key: K, data: T)
    where
        K: Eq + Hash + Clone,
    {
        if cache.len() >= self.max_entries {
            let now = Utc::now();
            cache.retain(|_, e| self.is_fresh(e, now));
        }
        while cache.len() >= self.max_entries {
            let oldest = cache
                .iter()
                .min_by_key(|e| e.value().sequence)
                .map(|e| e.key().clone());
            match oldest {
                Some(k) => {
                    cache.remove(&k);
                }
                None => break,
            }
        }

        cache.insert(
            key,
            CacheEntry {
                data,
                cached_at: Utc::now(),
                sequence: self.sequence.fetch_add(1, Ordering::Relaxed),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;

    #[test]
    fn test_compute_hits_after_first_call() {
        let cache = CachedAnalyzer::new(CountingAnalyzer::default(), 300, 100);
        let bars = rising_bars(60);
        let kind = IndicatorKind::rsi(14);

        let first = cache.compute("NABIL", &kind, &bars).unwrap();
        let second = cache.compute("nabil", &kind, &bars).unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.inner().compute_calls(), 1);
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_new_bar_is_a_miss() {
        let cache = CachedAnalyzer::new(CountingAnalyzer::default(), 300, 100);
        let bars = rising_bars(61);
        cache.analyze("NABIL", &bars[..60]).unwrap();
        cache.analyze("NABIL", &bars).unwrap();
        assert_eq!(cache.inner().analyze_calls(), 2);
    }

    #[test]
    fn test_revised_last_bar_is_a_miss() {
        let cache = CachedAnalyzer::new(CountingAnalyzer::default(), 300, 100);
        let bars = rising_bars(60);
        let mut revised = bars.clone();
        if let Some(last) = revised.last_mut() {
            last.close -= 0.5;
            last.volume += 10_000.0;
        }

        let before = cache.compute("NABIL", &IndicatorKind::sma(5), &bars).unwrap();
        let after = cache.compute("NABIL", &IndicatorKind::sma(5), &revised).unwrap();
        assert_eq!(cache.inner().compute_calls(), 2);
        assert_ne!(before, after);

        cache.analyze("NABIL", &bars).unwrap();
        cache.analyze("NABIL", &revised).unwrap();
        assert_eq!(cache.inner().analyze_calls(), 2);
    }

    #[test]
    fn test_same_length_different_history_is_a_miss() {
        let cache = CachedAnalyzer::new(CountingAnalyzer::default(), 300, 100);
        let rising = cache.analyze("NABIL", &rising_bars(80)).unwrap();
        let falling = cache.analyze("NABIL", &falling_bars(80)).unwrap();
        assert_eq!(cache.inner().analyze_calls(), 2);
        assert_ne!(rising.composite.label, falling.composite.label);
    }

    #[test]
    fn test_parameters_are_part_of_the_key() {
        let cache = CachedAnalyzer::new(CountingAnalyzer::default(), 300, 100);
        let bars = rising_bars(60);
        cache.compute("NABIL", &IndicatorKind::sma(10), &bars).unwrap();
        cache.compute("NABIL", &IndicatorKind::sma(20), &bars).unwrap();
        assert_eq!(cache.inner().compute_calls(), 2);
    }

    #[test]
    fn test_expired_entries_recompute() {
        let cache = CachedAnalyzer::new(CountingAnalyzer::default(), 0, 100);
        let bars = rising_bars(60);
        cache.analyze("NABIL", &bars).unwrap();
        cache.analyze("NABIL", &bars).unwrap();
        assert_eq!(cache.inner().analyze_calls(), 2);

        cache.purge_expired();
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache = CachedAnalyzer::new(CountingAnalyzer::default(), 300, 100);
        let bars = rising_bars(10);
        assert!(cache.analyze("NABIL", &bars).is_err());
        assert!(cache.analyze("NABIL", &bars).is_err());
        assert_eq!(cache.inner().analyze_calls(), 2);
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn test_bounded_by_max_entries() {
        let cache = CachedAnalyzer::new(CountingAnalyzer::default(), 300, 2);
        let bars = rising_bars(60);
        for period in [5, 10, 15] {
            cache.compute("NABIL", &IndicatorKind::sma(period), &bars).unwrap();
        }
        assert_eq!(cache.stats().entries, 2);

        // SMA(5) was the oldest and was evicted
        cache.compute("NABIL", &IndicatorKind::sma(15), &bars).unwrap();
        assert_eq!(cache.inner().compute_calls(), 3);
        cache.compute("NABIL", &IndicatorKind::sma(5), &bars).unwrap();
        assert_eq!(cache.inner().compute_calls(), 4);
    }

    #[test]
    fn test_invalidate_and_clear() {
        let cache = CachedAnalyzer::new(CountingAnalyzer::default(), 300, 100);
        let bars = rising_bars(60);
        cache.analyze("NABIL", &bars).unwrap();
        cache.analyze("NICA", &bars).unwrap();
        cache.compute("NABIL", &IndicatorKind::Obv, &bars).unwrap();
        assert_eq!(cache.stats().entries, 3);

        cache.invalidate("nabil");
        assert_eq!(cache.stats().entries, 1);

        cache.clear();
        assert_eq!(cache.stats().entries, 0);
    }
}
