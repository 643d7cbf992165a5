use chrono::{DateTime, FixedOffset, Utc};
use dashmap::DashMap;
use nepse_core::{SignalLabel, TechnicalReport, TrendDirection};
use serde::{Deserialize, Serialize};

use crate::store::normalize_symbol;

/// Nepal Time, UTC+05:45.
const NPT_OFFSET_SECS: i32 = 5 * 3600 + 45 * 60;

/// Transitions that raise an alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AlertKind {
    LabelChanged {
        from: SignalLabel,
        to: SignalLabel,
        score: f64,
    },
    TrendChanged {
        from: TrendDirection,
        to: TrendDirection,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalAlert {
    pub symbol: String,
    pub kind: AlertKind,
    /// Timestamp of the bar that triggered the alert
    pub as_of: DateTime<Utc>,
    pub title: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy)]
struct Observation {
    label: SignalLabel,
    direction: TrendDirection,
}

/// Remembers the last label and trend per symbol and reports changes.
#[derive(Default)]
pub struct AlertTracker {
    last_seen: DashMap<String, Observation>,
}

pub fn nepal_time(ts: DateTime<Utc>) -> DateTime<FixedOffset> {
    // east_opt only rejects offsets beyond a day
    match FixedOffset::east_opt(NPT_OFFSET_SECS) {
        Some(offset) => ts.with_timezone(&offset),
        None => ts.fixed_offset(),
    }
}

fn direction_name(direction: TrendDirection) -> &'static str {
    match direction {
        TrendDirection::Bullish => "bullish",
        TrendDirection::Bearish => "bearish",
        TrendDirection::Sideways => "sideways",
    }
}

impl AlertTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `report` and return the alerts it triggers. The first report
    /// for a symbol only sets the baseline.
    pub fn observe(&self, report: &TechnicalReport) -> Vec<SignalAlert> {
        let symbol = normalize_symbol(&report.symbol);
        let current = Observation {
            label: report.composite.label,
            direction: report.trend.direction,
        };

        let Some(previous) = self.last_seen.insert(symbol.clone(), current) else {
            tracing::debug!("Baseline for {}: {}", symbol, current.label);
            return Vec::new();
        };

        let when = nepal_time(report.as_of).format("%Y-%m-%d %H:%M NPT");
        let mut alerts = Vec::new();

        if previous.label != current.label {
            alerts.push(SignalAlert {
                symbol: symbol.clone(),
                kind: AlertKind::LabelChanged {
                    from: previous.label,
                    to: current.label,
                    score: report.composite.score,
                },
                as_of: report.as_of,
                title: format!("{}: {} -> {}", symbol, previous.label, current.label),
                message: format!(
                    "{} moved from {} to {} (score {:.1}) at {}",
                    symbol, previous.label, current.label, report.composite.score, when
                ),
            });
        }

        if previous.direction != current.direction {
            alerts.push(SignalAlert {
                symbol: symbol.clone(),
                kind: AlertKind::TrendChanged {
                    from: previous.direction,
                    to: current.direction,
                },
                as_of: report.as_of,
                title: format!("{}: trend turned {}", symbol, direction_name(current.direction)),
                message: format!(
                    "{} trend changed from {} to {} at {}",
                    symbol,
                    direction_name(previous.direction),
                    direction_name(current.direction),
                    when
                ),
            });
        }

        for alert in &alerts {
            tracing::info!("{}", alert.title);
        }
        alerts
    }

    pub fn last_label(&self, symbol: &str) -> Option<SignalLabel> {
        self.last_seen.get(&normalize_symbol(symbol)).map(|o| o.label)
    }

    /// Forget `symbol`; its next report becomes a new baseline.
    pub fn reset(&self, symbol: &str) {
        self.last_seen.remove(&normalize_symbol(symbol));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use nepse_technical::TechnicalAnalysisEngine;

    fn report(bars: &[nepse_core::Bar]) -> TechnicalReport {
        TechnicalAnalysisEngine::new().analyze("NABIL", bars).unwrap()
    }

    #[test]
    fn test_first_observation_is_baseline() {
        let tracker = AlertTracker::new();
        assert!(tracker.observe(&report(&rising_bars(80))).is_empty());
        assert_eq!(tracker.last_label("nabil"), Some(SignalLabel::Buy));
    }

    #[test]
    fn test_unchanged_report_raises_nothing() {
        let tracker = AlertTracker::new();
        let r = report(&rising_bars(80));
        tracker.observe(&r);
        assert!(tracker.observe(&r).is_empty());
    }

    #[test]
    fn test_reversal_raises_label_and_trend_alerts() {
        let tracker = AlertTracker::new();
        tracker.observe(&report(&rising_bars(80)));

        let alerts = tracker.observe(&report(&falling_bars(80)));
        assert_eq!(alerts.len(), 2);
        assert!(matches!(
            alerts[0].kind,
            AlertKind::LabelChanged { from: SignalLabel::Buy, to: SignalLabel::Sell, .. }
        ));
        assert_eq!(
            alerts[1].kind,
            AlertKind::TrendChanged { from: TrendDirection::Bullish, to: TrendDirection::Bearish }
        );
        assert_eq!(alerts[0].title, "NABIL: Buy -> Sell");
    }

    #[test]
    fn test_message_uses_nepal_time() {
        let tracker = AlertTracker::new();
        tracker.observe(&report(&rising_bars(80)));
        let alerts = tracker.observe(&report(&falling_bars(80)));

        // Bar 79 is 2024-03-20 00:00 UTC
        assert!(alerts[0].message.ends_with("at 2024-03-20 05:45 NPT"));
    }

    #[test]
    fn test_symbols_normalized_like_the_store() {
        let tracker = AlertTracker::new();
        let engine = TechnicalAnalysisEngine::new();
        tracker.observe(&engine.analyze(" nabil ", &rising_bars(80)).unwrap());

        let alerts = tracker.observe(&engine.analyze("NABIL", &falling_bars(80)).unwrap());
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].symbol, "NABIL");
        assert_eq!(tracker.last_label(" Nabil"), Some(SignalLabel::Sell));
    }

    #[test]
    fn test_reset_starts_new_baseline() {
        let tracker = AlertTracker::new();
        tracker.observe(&report(&rising_bars(80)));
        tracker.reset("NABIL");
        assert!(tracker.observe(&report(&falling_bars(80))).is_empty());
    }
}
