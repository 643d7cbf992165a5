use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use nepse_core::TechnicalReport;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Persistence for the latest report of each instrument.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Save (or replace) the report for `report.symbol`
    async fn save(&self, report: &TechnicalReport) -> Result<()>;

    /// Latest saved report, `None` if the symbol was never saved
    async fn load(&self, symbol: &str) -> Result<Option<TechnicalReport>>;

    /// Returns whether anything was removed
    async fn remove(&self, symbol: &str) -> Result<bool>;

    /// Saved symbols, sorted
    async fn symbols(&self) -> Result<Vec<String>>;
}

/// Trimmed, upper case `[A-Z0-9_-]`; anything else becomes `_`.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol
        .trim()
        .chars()
        .map(|c| c.to_ascii_uppercase())
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}

/// [`normalize_symbol`], rejecting blank symbols.
pub fn sanitize_symbol(symbol: &str) -> Result<String> {
    let normalized = normalize_symbol(symbol);
    if normalized.is_empty() {
        bail!("Symbol must not be empty");
    }
    Ok(normalized)
}

/// In-process store holding reports as JSON values.
#[derive(Default)]
pub struct MemoryStore {
    reports: DashMap<String, serde_json::Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn save(&self, report: &TechnicalReport) -> Result<()> {
        let key = sanitize_symbol(&report.symbol)?;
        let value = serde_json::to_value(report).context("Failed to serialize report")?;
        self.reports.insert(key, value);
        Ok(())
    }

    async fn load(&self, symbol: &str) -> Result<Option<TechnicalReport>> {
        let key = sanitize_symbol(symbol)?;
        let Some(value) = self.reports.get(&key).map(|v| v.value().clone()) else {
            return Ok(None);
        };
        let report = serde_json::from_value(value)
            .with_context(|| format!("Stored report for {key} is corrupt"))?;
        Ok(Some(report))
    }

    async fn remove(&self, symbol: &str) -> Result<bool> {
        let key = sanitize_symbol(symbol)?;
        Ok(self.reports.remove(&key).is_some())
    }

    async fn symbols(&self) -> Result<Vec<String>> {
        let mut symbols: Vec<String> = self.reports.iter().map(|e| e.key().clone()).collect();
        symbols.sort();
        Ok(symbols)
    }
}

/// One `<SYMBOL>.json` file per instrument under a snapshot directory.
///
/// Writes go to a `.json.tmp` sibling first and are renamed into place, so
/// a reader never sees a half-written report.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, symbol: &str) -> Result<PathBuf> {
        Ok(self.dir.join(format!("{}.json", sanitize_symbol(symbol)?)))
    }
}

#[async_trait]
impl ReportStore for JsonFileStore {
    async fn save(&self, report: &TechnicalReport) -> Result<()> {
        let path = self.path_for(&report.symbol)?;
        let content = serde_json::to_string_pretty(report).context("Failed to serialize report")?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, content)
            .await
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .with_context(|| format!("Failed to rename {} into place", tmp_path.display()))?;

        tracing::debug!("Saved report for {} to {}", report.symbol, path.display());
        Ok(())
    }

    async fn load(&self, symbol: &str) -> Result<Option<TechnicalReport>> {
        let path = self.path_for(symbol)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
        };
        let report = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Some(report))
    }

    async fn remove(&self, symbol: &str) -> Result<bool> {
        let path = self.path_for(symbol)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
        }
    }

    async fn symbols(&self) -> Result<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).with_context(|| format!("Failed to list {}", self.dir.display())),
        };

        let mut symbols = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                symbols.push(stem.to_string());
            }
        }
        symbols.sort();
        Ok(symbols)
    }
}
