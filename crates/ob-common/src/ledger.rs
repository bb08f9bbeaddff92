use std::{
    collections::BTreeMap,
    fmt,
    fs::{self, File, OpenOptions},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schedule::OrderRecord;

pub const DEFAULT_LEDGER_FILE: &str = "created_order_hashes.txt";

const SECTION_HEADER: &str = "Invoke tx hashes:";

/// Transaction identifier returned by the chain CLI.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxHash(String);

impl TxHash {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("line {line}: malformed ledger entry '{content}'")]
    Malformed { line: usize, content: String },
    #[error("failed to write csv summary: {0}")]
    Csv(#[from] csv::Error),
}

/// Start date -> submitted tx hash, ordered by start date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HashLedger {
    entries: BTreeMap<i64, TxHash>,
}

impl HashLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, start_date: i64, hash: TxHash) {
        self.entries.insert(start_date, hash);
    }

    pub fn get(&self, start_date: i64) -> Option<&TxHash> {
        self.entries.get(&start_date)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, &TxHash)> {
        self.entries.iter().map(|(start, hash)| (*start, hash))
    }

    pub fn hashes(&self) -> Vec<TxHash> {
        self.entries.values().cloned().collect()
    }

    /// Renders one ledger section: header, one line per order, blank line.
    pub fn render(&self, span_days: u32) -> String {
        let mut out = String::new();
        out.push_str(SECTION_HEADER);
        out.push('\n');
        for (start, hash) in self.iter() {
            out.push_str(&format!(
                "order of {span_days} days starting at {start} invoked with tx_hash={hash}\n"
            ));
        }
        out.push('\n');
        out
    }

    /// Appends a section to `path`, creating the file if needed.
    pub fn append_to(&self, path: &Path, span_days: u32) -> Result<(), LedgerError> {
        let write_err = |source| LedgerError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(write_err)?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(self.render(span_days).as_bytes())
            .map_err(write_err)?;
        writer.flush().map_err(write_err)?;
        Ok(())
    }

    /// Parses every section of a ledger file. Later sections win on
    /// duplicate start dates.
    pub fn parse(text: &str) -> Result<Self, LedgerError> {
        let mut ledger = Self::new();
        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line == SECTION_HEADER {
                continue;
            }
            let (start, hash) = parse_entry(line).ok_or_else(|| LedgerError::Malformed {
                line: idx + 1,
                content: line.to_string(),
            })?;
            ledger.record(start, hash);
        }
        Ok(ledger)
    }

    pub fn load(path: &Path) -> Result<Self, LedgerError> {
        let text = fs::read_to_string(path).map_err(|source| LedgerError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }
}

fn parse_entry(line: &str) -> Option<(i64, TxHash)> {
    let rest = line.strip_prefix("order of ")?;
    let (_, rest) = rest.split_once(" days starting at ")?;
    let (start, hash) = rest.split_once(" invoked with tx_hash=")?;
    let start = start.trim().parse::<i64>().ok()?;
    let hash = hash.trim();
    if hash.is_empty() {
        return None;
    }
    Some((start, TxHash::new(hash)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
struct SummaryRow<'a> {
    start_date: i64,
    end_date: i64,
    amount: u64,
    price: u64,
    direction: u8,
    tx_hash: Option<&'a str>,
}

/// Writes one CSV row per order; orders that were never submitted have an
/// empty `tx_hash`.
pub fn write_csv_summary(
    path: &Path,
    orders: &[OrderRecord],
    ledger: &HashLedger,
) -> Result<(), LedgerError> {
    let file = File::create(path).map_err(|source| LedgerError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = csv::Writer::from_writer(file);
    for order in orders {
        writer.serialize(SummaryRow {
            start_date: order.start_date,
            end_date: order.end_date,
            amount: order.amount,
            price: order.price,
            direction: order.direction,
            tx_hash: ledger.get(order.start_date).map(TxHash::as_str),
        })?;
    }
    writer.flush().map_err(|source| LedgerError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}
