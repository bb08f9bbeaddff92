use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use ob_common::{
    selector_from_name, tx_hash_from_message, txhash::felt_to_hex, ChainId, L1Message,
};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Compute the L2 transaction hash of an L1 -> L2 message",
    disable_help_subcommand = true,
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(flatten)]
    message: MessageArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the entry point selector for a function name
    Selector { name: String },
}

#[derive(Args, Debug)]
struct MessageArgs {
    /// JSON file with fromAddress, toAddress, selector, nonce and payload
    #[arg(long)]
    message: Option<PathBuf>,

    /// Chain id: mainnet, goerli, sepolia or a raw felt
    #[arg(long, env = "OB_CHAIN_ID", default_value = "goerli")]
    chain_id: String,

    /// L1 sender (Ethereum address)
    #[arg(long)]
    from_address: Option<String>,

    /// L2 contract receiving the message
    #[arg(long)]
    to_address: Option<String>,

    /// `l1_handler` entry point selector
    #[arg(long)]
    selector: Option<String>,

    #[arg(long)]
    nonce: Option<String>,

    /// Message payload, comma separated
    #[arg(long, value_delimiter = ',')]
    payload: Option<Vec<String>>,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output = match cli.command {
        Some(Command::Selector { name }) => felt_to_hex(&selector_from_name(&name)),
        None => compute(&cli.message)?,
    };
    println!("{output}");
    Ok(())
}

fn compute(args: &MessageArgs) -> Result<String> {
    let message = resolve_message(args)?;
    let chain_id: ChainId = args.chain_id.parse()?;
    debug!(?message, ?chain_id, "computing l1_handler tx hash");
    Ok(tx_hash_from_message(&message, chain_id)?)
}

fn resolve_message(args: &MessageArgs) -> Result<L1Message> {
    let mut message: L1Message = match &args.message {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read message file {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse message file {}", path.display()))?
        }
        None => L1Message::default(),
    };

    if let Some(from) = &args.from_address {
        message.from_address = from.clone();
    }
    if let Some(to) = &args.to_address {
        message.to_address = to.clone();
    }
    if let Some(selector) = &args.selector {
        message.selector = selector.clone();
    }
    if let Some(nonce) = &args.nonce {
        message.nonce = nonce.clone();
    }
    if let Some(payload) = &args.payload {
        message.payload = payload.clone();
    }
    Ok(message)
}
