use anyhow::{Context, Result};
use nepse_core::{Bar, EngineError, TechnicalAnalyzer, TechnicalReport};
use nepse_technical::TechnicalAnalysisEngine;
use rayon::prelude::*;
use serde::Serialize;
use std::sync::Arc;

use crate::alerts::{AlertTracker, SignalAlert};
use crate::cache::CachedAnalyzer;
use crate::config::ServiceConfig;
use crate::store::{JsonFileStore, ReportStore};

/// Result of refreshing one instrument.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshOutcome {
    pub report: TechnicalReport,
    pub alerts: Vec<SignalAlert>,
    /// False when the store rejected the report; the report is still valid
    pub persisted: bool,
}

/// Cached analysis, persistence and alerting for a set of instruments.
pub struct SignalService<A, S> {
    analyzer: Arc<CachedAnalyzer<A>>,
    store: S,
    alerts: AlertTracker,
}

impl SignalService<TechnicalAnalysisEngine, JsonFileStore> {
    /// Default engine with JSON snapshots, both from `config`.
    pub fn from_config(config: &ServiceConfig) -> Self {
        let engine = TechnicalAnalysisEngine::with_config(config.engine.clone());
        Self::new(
            CachedAnalyzer::from_config(engine, config),
            JsonFileStore::new(config.snapshot_dir.clone()),
        )
    }
}

impl<A: TechnicalAnalyzer + 'static, S: ReportStore> SignalService<A, S> {
    pub fn new(analyzer: CachedAnalyzer<A>, store: S) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
            store,
            alerts: AlertTracker::new(),
        }
    }

    pub fn analyzer(&self) -> &CachedAnalyzer<A> {
        &self.analyzer
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn alerts(&self) -> &AlertTracker {
        &self.alerts
    }

    /// Analyze (through the cache), persist, then check for alerts.
    pub async fn refresh(&self, symbol: &str, bars: &[Bar]) -> Result<RefreshOutcome, EngineError> {
        let report = self.analyzer.analyze(symbol, bars)?;
        Ok(self.publish(report).await)
    }

    /// Analyze every instrument in parallel on the blocking pool, then
    /// persist and alert in input order.
    pub async fn refresh_many(
        &self,
        inputs: &[(String, Vec<Bar>)],
    ) -> Result<Vec<(String, Result<RefreshOutcome, EngineError>)>> {
        let analyzer = Arc::clone(&self.analyzer);
        let owned = inputs.to_vec();
        let analyzed: Vec<Result<TechnicalReport, EngineError>> = tokio::task::spawn_blocking(move || {
            owned
                .par_iter()
                .map(|(symbol, bars)| analyzer.analyze(symbol, bars))
                .collect()
        })
        .await
        .context("Batch analysis task failed")?;

        let mut outcomes = Vec::with_capacity(inputs.len());
        for ((symbol, _), result) in inputs.iter().zip(analyzed) {
            let outcome = match result {
                Ok(report) => Ok(self.publish(report).await),
                Err(e) => {
                    tracing::warn!("Analysis failed for {}: {}", symbol, e);
                    Err(e)
                }
            };
            outcomes.push((symbol.clone(), outcome));
        }
        Ok(outcomes)
    }

    /// Last persisted report for `symbol`.
    pub async fn latest(&self, symbol: &str) -> Result<Option<TechnicalReport>> {
        self.store.load(symbol).await
    }

    async fn publish(&self, report: TechnicalReport) -> RefreshOutcome {
        let persisted = match self.store.save(&report).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to persist report for {}: {:#}", report.symbol, e);
                false
            }
        };
        let alerts = self.alerts.observe(&report);
        RefreshOutcome {
            report,
            alerts,
            persisted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::test_support::*;
    use async_trait::async_trait;
    use nepse_core::SignalLabel;
    use tempfile::TempDir;

    fn service() -> SignalService<CountingAnalyzer, MemoryStore> {
        SignalService::new(
            CachedAnalyzer::new(CountingAnalyzer::default(), 300, 100),
            MemoryStore::new(),
        )
    }

    struct FailingStore;

    #[async_trait]
    impl ReportStore for FailingStore {
        async fn save(&self, _report: &TechnicalReport) -> Result<()> {
            anyhow::bail!("disk full")
        }
        async fn load(&self, _symbol: &str) -> Result<Option<TechnicalReport>> {
            Ok(None)
        }
        async fn remove(&self, _symbol: &str) -> Result<bool> {
            Ok(false)
        }
        async fn symbols(&self) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_refresh_persists_and_caches() {
        let service = service();
        let bars = rising_bars(80);

        let outcome = service.refresh("NABIL", &bars).await.unwrap();
        assert!(outcome.persisted);
        assert!(outcome.alerts.is_empty());
        assert_eq!(outcome.report.composite.label, SignalLabel::Buy);

        let latest = service.latest("NABIL").await.unwrap().unwrap();
        assert_eq!(latest, outcome.report);

        service.refresh("NABIL", &bars).await.unwrap();
        assert_eq!(service.analyzer().inner().analyze_calls(), 1);
    }

    #[tokio::test]
    async fn test_refresh_reports_transitions() {
        let service = service();
        service.refresh("NABIL", &rising_bars(80)).await.unwrap();
        let outcome = service.refresh("NABIL", &falling_bars(80)).await.unwrap();
        assert_eq!(outcome.alerts.len(), 2);
        assert_eq!(service.alerts().last_label("NABIL"), Some(SignalLabel::Sell));
    }

    #[tokio::test]
    async fn test_refresh_propagates_engine_errors() {
        let service = service();
        let err = service.refresh("NABIL", &rising_bars(20)).await.unwrap_err();
        assert_eq!(err, EngineError::InsufficientData { required: 50, actual: 20 });
        assert!(service.latest("NABIL").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_failure_still_returns_report() {
        let service = SignalService::new(
            CachedAnalyzer::new(CountingAnalyzer::default(), 300, 100),
            FailingStore,
        );
        let outcome = service.refresh("NABIL", &rising_bars(80)).await.unwrap();
        assert!(!outcome.persisted);
        assert_eq!(outcome.report.symbol, "NABIL");
    }

    #[tokio::test]
    async fn test_refresh_many_keeps_input_order() {
        let service = service();
        let inputs = vec![
            ("NABIL".to_string(), rising_bars(80)),
            ("NICA".to_string(), rising_bars(10)),
            ("HIDCL".to_string(), falling_bars(80)),
        ];
        let outcomes = service.refresh_many(&inputs).await.unwrap();

        let symbols: Vec<&str> = outcomes.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(symbols, vec!["NABIL", "NICA", "HIDCL"]);
        assert!(outcomes[0].1.is_ok());
        assert!(matches!(outcomes[1].1, Err(EngineError::InsufficientData { .. })));
        assert_eq!(
            outcomes[2].1.as_ref().unwrap().report.composite.label,
            SignalLabel::Sell
        );
        assert_eq!(
            service.store().symbols().await.unwrap(),
            vec!["HIDCL".to_string(), "NABIL".to_string()]
        );
    }

    #[tokio::test]
    async fn test_from_config_writes_snapshots() {
        let dir = TempDir::new().unwrap();
        let config = ServiceConfig {
            snapshot_dir: dir.path().to_path_buf(),
            ..ServiceConfig::default()
        };
        let service = SignalService::from_config(&config);
        service.refresh("nabil", &rising_bars(80)).await.unwrap();
        assert!(dir.path().join("NABIL.json").exists());
        assert!(service.latest("NABIL").await.unwrap().is_some());
    }
}
