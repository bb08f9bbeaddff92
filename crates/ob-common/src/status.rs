use std::fmt;

use serde::Deserialize;

/// Transaction status as reported by `starknet tx_status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxStatus {
    NotReceived,
    Received,
    Pending,
    AcceptedOnL2,
    AcceptedOnL1,
    Rejected,
    Reverted,
    Other(String),
}

impl TxStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "NOT_RECEIVED" => TxStatus::NotReceived,
            "RECEIVED" => TxStatus::Received,
            "PENDING" => TxStatus::Pending,
            "ACCEPTED_ON_L2" => TxStatus::AcceptedOnL2,
            "ACCEPTED_ON_L1" => TxStatus::AcceptedOnL1,
            "REJECTED" => TxStatus::Rejected,
            "REVERTED" => TxStatus::Reverted,
            _ => TxStatus::Other(raw.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TxStatus::NotReceived => "NOT_RECEIVED",
            TxStatus::Received => "RECEIVED",
            TxStatus::Pending => "PENDING",
            TxStatus::AcceptedOnL2 => "ACCEPTED_ON_L2",
            TxStatus::AcceptedOnL1 => "ACCEPTED_ON_L1",
            TxStatus::Rejected => "REJECTED",
            TxStatus::Reverted => "REVERTED",
            TxStatus::Other(raw) => raw,
        }
    }

    /// L1 acceptance only ever follows L2 acceptance, so both are final.
    pub fn is_accepted(&self) -> bool {
        matches!(self, TxStatus::AcceptedOnL2 | TxStatus::AcceptedOnL1)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, TxStatus::Rejected | TxStatus::Reverted)
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    tx_status: String,
}

/// Decodes the JSON document printed by `tx_status`. Extra fields
/// (`block_hash`, `tx_failure_reason`, ...) are ignored.
pub fn parse_status_response(raw: &str) -> serde_json::Result<TxStatus> {
    let response: StatusResponse = serde_json::from_str(raw.trim())?;
    Ok(TxStatus::parse(&response.tx_status))
}
