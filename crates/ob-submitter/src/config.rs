use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ob_common::{OrderSchedule, DEFAULT_LEDGER_FILE};
use serde::Deserialize;

use crate::poll::{DEFAULT_INTERVAL_SECS, DEFAULT_MAX_ATTEMPTS};

pub const DEFAULT_ORDER_BOOK_ADDRESS: &str =
    "0x07d8292ec203cee3aab860b9a8c64632012641a217918137a55c33d73cad03f1";
pub const DEFAULT_ABI: &str = "order_book_abi.json";
pub const DEFAULT_FUNCTION: &str = "create_and_fill";

/// Optional YAML batch description. Every field falls back to the built-in
/// batch, and command line flags win over the file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BatchConfig {
    pub chain_bin: Option<String>,
    pub network: Option<String>,
    pub account: Option<String>,
    pub contract_address: String,
    pub abi: PathBuf,
    pub function: String,
    pub schedule: OrderSchedule,
    pub poll_interval_secs: u64,
    pub max_attempts: u32,
    pub ledger: PathBuf,
    pub csv: Option<PathBuf>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            chain_bin: None,
            network: None,
            account: None,
            contract_address: DEFAULT_ORDER_BOOK_ADDRESS.to_string(),
            abi: PathBuf::from(DEFAULT_ABI),
            function: DEFAULT_FUNCTION.to_string(),
            schedule: OrderSchedule::default(),
            poll_interval_secs: DEFAULT_INTERVAL_SECS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            ledger: PathBuf::from(DEFAULT_LEDGER_FILE),
            csv: None,
        }
    }
}

impl BatchConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read batch config {}", path.display()))?;
        Self::from_yaml(&raw)
            .with_context(|| format!("failed to parse batch config {}", path.display()))
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
