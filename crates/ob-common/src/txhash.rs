//! Starknet transaction hashes built from Pedersen chains.
//!
//! Only the L1 handler flavour is exposed: a message sent from an Ethereum
//! contract is consumed on L2 by an `l1_handler` entry point, and its tx hash
//! is known ahead of time from the message fields alone.

use std::str::FromStr;

use ethers::{types::Address, utils::keccak256};
use serde::{Deserialize, Serialize};
use starknet_crypto::{pedersen_hash, FieldElement};
use thiserror::Error;

/// `int.from_bytes(b"l1_handler", "big")`
pub const L1_HANDLER_PREFIX: &[u8] = b"l1_handler";

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("invalid field element for {field}: '{value}'")]
    InvalidFelt { field: &'static str, value: String },
    #[error("invalid L1 address '{0}'")]
    InvalidAddress(String),
    #[error("unknown chain id '{0}'")]
    UnknownChain(String),
}

/// Parses a decimal or `0x`-prefixed hex felt.
pub fn parse_felt(field: &'static str, raw: &str) -> Result<FieldElement, MessageError> {
    FieldElement::from_str(raw.trim()).map_err(|_| MessageError::InvalidFelt {
        field,
        value: raw.to_string(),
    })
}

pub fn felt_to_hex(value: &FieldElement) -> String {
    format!("{value:#x}")
}

fn felt_from_short_string(bytes: &[u8]) -> FieldElement {
    // Short strings are < 32 bytes and far below the field prime.
    FieldElement::from_byte_slice_be(bytes).unwrap_or(FieldElement::ZERO)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainId {
    Mainnet,
    Goerli,
    Sepolia,
    Custom(FieldElement),
}

impl ChainId {
    pub fn felt(&self) -> FieldElement {
        match self {
            ChainId::Mainnet => felt_from_short_string(b"SN_MAIN"),
            ChainId::Goerli => felt_from_short_string(b"SN_GOERLI"),
            ChainId::Sepolia => felt_from_short_string(b"SN_SEPOLIA"),
            ChainId::Custom(felt) => *felt,
        }
    }
}

impl FromStr for ChainId {
    type Err = MessageError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "mainnet" | "sn_main" => Ok(ChainId::Mainnet),
            "goerli" | "testnet" | "sn_goerli" => Ok(ChainId::Goerli),
            "sepolia" | "sn_sepolia" => Ok(ChainId::Sepolia),
            _ => parse_felt("chain_id", raw)
                .map(ChainId::Custom)
                .map_err(|_| MessageError::UnknownChain(raw.to_string())),
        }
    }
}

/// `compute_hash_on_elements`: Pedersen fold from zero, closed with the length.
pub fn compute_hash_on_elements(data: &[FieldElement]) -> FieldElement {
    let acc = data
        .iter()
        .fold(FieldElement::ZERO, |acc, item| pedersen_hash(&acc, item));
    pedersen_hash(&acc, &FieldElement::from(data.len()))
}

/// Fields common to every Starknet tx hash of the pre-v1 scheme.
#[derive(Debug, Clone)]
pub struct TxHashFields<'a> {
    pub prefix: FieldElement,
    pub version: FieldElement,
    pub contract_address: FieldElement,
    pub entry_point_selector: FieldElement,
    pub calldata: &'a [FieldElement],
    pub max_fee: FieldElement,
    pub chain_id: FieldElement,
    pub additional_data: &'a [FieldElement],
}

pub fn calculate_transaction_hash_common(fields: &TxHashFields<'_>) -> FieldElement {
    let calldata_hash = compute_hash_on_elements(fields.calldata);
    let mut data = vec![
        fields.prefix,
        fields.version,
        fields.contract_address,
        fields.entry_point_selector,
        calldata_hash,
        fields.max_fee,
        fields.chain_id,
    ];
    data.extend_from_slice(fields.additional_data);
    compute_hash_on_elements(&data)
}

/// Raw L1 -> L2 message as read from a file or the command line. Numbers are
/// strings so values wider than 64 bits survive JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct L1Message {
    pub from_address: String,
    pub to_address: String,
    pub selector: String,
    pub nonce: String,
    pub payload: Vec<String>,
}

impl Default for L1Message {
    fn default() -> Self {
        Self {
            from_address: "0xdc03b0028e3afa0cb865c28e6c57f0a3a77c5cd7".to_string(),
            to_address:
                "1288861057681573168267271242332914037939928261850385863052822792441744683451"
                    .to_string(),
            selector:
                "656059555830309884025984481032325730537460019592461379540739705017927077473"
                    .to_string(),
            nonce: "756645".to_string(),
            payload: vec![
                "2930266564062182357406610323500398021706613129656897641475375789725703676161"
                    .to_string(),
                "10000".to_string(),
                "86400".to_string(),
                "2000".to_string(),
                "1000".to_string(),
            ],
        }
    }
}

impl L1Message {
    pub fn from_address_felt(&self) -> Result<FieldElement, MessageError> {
        let address = Address::from_str(self.from_address.trim())
            .map_err(|_| MessageError::InvalidAddress(self.from_address.clone()))?;
        FieldElement::from_byte_slice_be(address.as_bytes())
            .map_err(|_| MessageError::InvalidAddress(self.from_address.clone()))
    }

    pub fn tx_hash(&self, chain_id: ChainId) -> Result<FieldElement, MessageError> {
        let mut calldata = Vec::with_capacity(self.payload.len() + 1);
        calldata.push(self.from_address_felt()?);
        for item in &self.payload {
            calldata.push(parse_felt("payload", item)?);
        }
        let nonce = [parse_felt("nonce", &self.nonce)?];

        let fields = TxHashFields {
            prefix: felt_from_short_string(L1_HANDLER_PREFIX),
            version: FieldElement::ZERO,
            contract_address: parse_felt("to_address", &self.to_address)?,
            entry_point_selector: parse_felt("selector", &self.selector)?,
            calldata: &calldata,
            max_fee: FieldElement::ZERO,
            chain_id: chain_id.felt(),
            additional_data: &nonce,
        };
        Ok(calculate_transaction_hash_common(&fields))
    }
}

/// Hex-formatted hash of an L1 handler transaction.
pub fn tx_hash_from_message(message: &L1Message, chain_id: ChainId) -> Result<String, MessageError> {
    message.tx_hash(chain_id).map(|hash| felt_to_hex(&hash))
}

/// Entry point selector: keccak256 of the name truncated to 250 bits.
pub fn starknet_keccak(data: &[u8]) -> FieldElement {
    let mut digest = keccak256(data);
    digest[0] &= 0x03;
    FieldElement::from_bytes_be(&digest).unwrap_or(FieldElement::ZERO)
}

pub fn selector_from_name(name: &str) -> FieldElement {
    starknet_keccak(name.as_bytes())
}
