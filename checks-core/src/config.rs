use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Deployment settings for a ledger instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerConfig {
    /// Seed mixed into the derived contract identity
    pub contract_seed: String,

    /// Lets one deployer create several independent contracts
    pub contract_nonce: u64,

    /// Where the event journal is written, if anywhere
    pub journal_path: Option<PathBuf>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            contract_seed: "checks".to_string(),
            contract_nonce: 0,
            journal_path: None,
        }
    }
}

impl LedgerConfig {
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("failed to parse ledger config")
    }

    /// Load a JSON config file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read ledger config {}", path.display()))?;
        let config = Self::from_json_str(&contents)?;
        log::debug!("Loaded ledger config from {}", path.display());
        Ok(config)
    }
}
