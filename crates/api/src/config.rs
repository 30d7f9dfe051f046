use serde::{Deserialize, Serialize};

use scanner::PrecisionMode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub bind_addr: String,
    pub store: StoreConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StoreConfig {
    Memory,
    Sqlite { url: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub io_timeout_secs: u64,
    pub default_precision_mode: PrecisionMode,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            store: StoreConfig::Memory,
            pipeline: PipelineConfig {
                io_timeout_secs: 30,
                default_precision_mode: PrecisionMode::High,
            },
        }
    }
}

impl AppConfig {
    /// Defaults overridden by `BIND_ADDR`, `DATABASE_URL` and
    /// `PIPELINE_IO_TIMEOUT_SECS` when present.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(addr) = std::env::var("BIND_ADDR") {
            cfg.bind_addr = addr;
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            cfg.store = StoreConfig::Sqlite { url };
        }
        if let Ok(secs) = std::env::var("PIPELINE_IO_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                cfg.pipeline.io_timeout_secs = secs;
            }
        }
        cfg
    }
}
