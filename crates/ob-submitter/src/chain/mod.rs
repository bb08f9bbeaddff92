mod starknet_cli;

use std::path::PathBuf;

use ob_common::{OrderRecord, TxHash, TxStatus};
use thiserror::Error;

pub use starknet_cli::{StarknetCli, DEFAULT_PROGRAM};

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("'{program} {subcommand}' exited with {code:?}: {stderr}")]
    CommandFailed {
        program: String,
        subcommand: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("'{program}' printed non UTF-8 output")]
    NonUtf8 { program: String },
    #[error("no transaction hash in invoke output: '{output}'")]
    MissingTxHash { output: String },
    #[error("malformed tx_status output '{output}': {source}")]
    MalformedStatus {
        output: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A contract invocation as handed to the chain tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeCall {
    pub contract_address: String,
    pub abi: PathBuf,
    pub function: String,
    pub inputs: Vec<String>,
}

/// Order book contract every order of a batch is sent to.
#[derive(Debug, Clone)]
pub struct OrderBookTarget {
    pub contract_address: String,
    pub abi: PathBuf,
    pub function: String,
}

impl OrderBookTarget {
    pub fn call_for(&self, order: &OrderRecord) -> InvokeCall {
        InvokeCall {
            contract_address: self.contract_address.clone(),
            abi: self.abi.clone(),
            function: self.function.clone(),
            inputs: order.inputs().to_vec(),
        }
    }
}

/// Submission and status queries against the ledger.
#[allow(async_fn_in_trait)]
pub trait ChainClient {
    async fn invoke(&self, call: &InvokeCall) -> Result<TxHash, ChainError>;

    async fn tx_status(&self, hash: &TxHash) -> Result<TxStatus, ChainError>;
}
