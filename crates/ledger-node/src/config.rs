use anyhow::{ensure, Context, Result};
use ledger_core::constants::HASH_HEX_SIZE;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::{DEFAULT_DATA_DIR, DEFAULT_HTTP_ADDR, DEFAULT_PEER_PORT};

/// Node settings, read from a JSON file. Missing fields fall back to defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// TCP port the peer listener binds to.
    pub port: u16,
    pub http_addr: String,
    #[serde(alias = "dbPath")]
    pub db_path: String,
    /// Peer addresses (`host:port`) that receive broadcasts.
    pub nodes: Vec<String>,
    pub difficulty: u32,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PEER_PORT,
            http_addr: DEFAULT_HTTP_ADDR.to_string(),
            db_path: DEFAULT_DATA_DIR.to_string(),
            nodes: Vec::new(),
            difficulty: ledger_core::constants::DEFAULT_DIFFICULTY,
        }
    }
}

impl NodeConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// A hex digest has `HASH_HEX_SIZE` digits, so no nonce can satisfy a
    /// higher difficulty and mining would never finish.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            (self.difficulty as usize) <= HASH_HEX_SIZE,
            "difficulty {} exceeds the maximum of {}",
            self.difficulty,
            HASH_HEX_SIZE
        );
        Ok(())
    }

    /// Configured peers with blank entries dropped.
    pub fn peers(&self) -> Vec<String> {
        self.nodes
            .iter()
            .map(|n| n.trim())
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .collect()
    }
}
