use anyhow::{bail, Context, Result};
use nepse_core::EngineConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    // Cache
    pub cache_ttl_secs: i64,          // 300 (5 minutes)
    pub cache_max_entries: usize,     // 1000

    // Persistence
    pub snapshot_dir: PathBuf,        // ./snapshots

    pub engine: EngineConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 300,
            cache_max_entries: 1000,
            snapshot_dir: PathBuf::from("./snapshots"),
            engine: EngineConfig::default(),
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            cache_ttl_secs: env::var("CACHE_TTL_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .context("CACHE_TTL_SECS must be an integer")?,
            cache_max_entries: env::var("CACHE_MAX_ENTRIES")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .context("CACHE_MAX_ENTRIES must be a positive integer")?,
            snapshot_dir: env::var("SNAPSHOT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./snapshots")),
            engine: EngineConfig::from_env()?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        // 0 disables reuse
        if self.cache_ttl_secs < 0 {
            bail!("cache_ttl_secs must be >= 0, got {}", self.cache_ttl_secs);
        }
        if self.cache_max_entries == 0 {
            bail!("cache_max_entries must be > 0");
        }
        self.engine.validate().context("Engine configuration rejected")?;
        Ok(())
    }
}
