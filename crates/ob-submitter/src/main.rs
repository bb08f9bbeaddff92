mod chain;
mod config;
mod poll;
mod submit;

use std::{path::PathBuf, time::Duration};

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use ob_common::{
    format_unix_date, parse_base_date, write_csv_summary, HashLedger, OrderSchedule, TxHash,
};
use tracing::{info, warn};

use chain::{OrderBookTarget, StarknetCli, DEFAULT_PROGRAM};
use config::BatchConfig;
use poll::{poll_until_all_accepted, PollPolicy};
use submit::submit_batch;

const DEFAULT_WATCH_INTERVAL_SECS: u64 = 10;
const DEFAULT_WATCH_ROUNDS: u32 = 100;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Submit order book invocations through the starknet CLI and track their status"
)]
struct Cli {
    /// YAML batch configuration (defaults to the built-in 60-day batch)
    #[arg(long, global = true, env = "OB_CONFIG")]
    config: Option<PathBuf>,

    /// Chain tool binary (env: OB_CHAIN_BIN)
    #[arg(long, global = true, env = "OB_CHAIN_BIN")]
    chain_bin: Option<String>,

    /// Network passed to the chain tool, e.g. alpha-goerli
    #[arg(long, global = true, env = "OB_NETWORK")]
    network: Option<String>,

    /// Account name passed to `invoke`
    #[arg(long, global = true, env = "OB_ACCOUNT")]
    account: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create one order per day, waiting for each to be accepted
    Submit(SubmitArgs),
    /// Poll a set of tx hashes until all of them are accepted
    Watch(WatchArgs),
}

#[derive(Args, Debug)]
struct SubmitArgs {
    /// Order book contract address
    #[arg(long, env = "OB_ORDER_BOOK_ADDRESS")]
    contract_address: Option<String>,

    /// Path to the order book ABI
    #[arg(long)]
    abi: Option<PathBuf>,

    /// Entry point to invoke
    #[arg(long)]
    function: Option<String>,

    /// First start date: YYYY-MM-DD or unix seconds
    #[arg(long)]
    base_date: Option<String>,

    /// Number of daily orders
    #[arg(long)]
    days: Option<u32>,

    #[arg(long)]
    amount: Option<u64>,

    #[arg(long)]
    price: Option<u64>,

    #[arg(long)]
    direction: Option<u8>,

    /// Days between an order's start and end date
    #[arg(long)]
    duration_days: Option<u32>,

    /// Seconds between status polls
    #[arg(long)]
    poll_interval_secs: Option<u64>,

    /// Status polls per order before giving up
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Ledger file the tx hashes are appended to
    #[arg(long)]
    ledger: Option<PathBuf>,

    /// Also write a CSV summary of the batch
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Print the planned invocations without running them
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[derive(Args, Debug)]
struct WatchArgs {
    /// Tx hash to watch (repeatable)
    #[arg(long = "hash")]
    hashes: Vec<String>,

    /// Read tx hashes from a ledger file written by `submit`
    #[arg(long)]
    ledger: Option<PathBuf>,

    #[arg(long, default_value_t = DEFAULT_WATCH_INTERVAL_SECS)]
    interval_secs: u64,

    #[arg(long, default_value_t = DEFAULT_WATCH_ROUNDS)]
    max_rounds: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = BatchConfig::load_or_default(cli.config.as_deref())?;

    let program = cli
        .chain_bin
        .clone()
        .or_else(|| config.chain_bin.clone())
        .unwrap_or_else(|| DEFAULT_PROGRAM.to_string());
    let client = StarknetCli::new(program)
        .with_network(cli.network.clone().or_else(|| config.network.clone()))
        .with_account(cli.account.clone().or_else(|| config.account.clone()));

    match cli.command {
        Command::Submit(args) => run_submit(&client, config, args).await,
        Command::Watch(args) => run_watch(&client, args).await,
    }
}

async fn run_submit(client: &StarknetCli, config: BatchConfig, args: SubmitArgs) -> Result<()> {
    let schedule = resolve_schedule(&config, &args)?;
    let target = OrderBookTarget {
        contract_address: args
            .contract_address
            .unwrap_or_else(|| config.contract_address.clone()),
        abi: args.abi.unwrap_or_else(|| config.abi.clone()),
        function: args.function.unwrap_or_else(|| config.function.clone()),
    };
    let policy = PollPolicy {
        interval: Duration::from_secs(
            args.poll_interval_secs
                .unwrap_or(config.poll_interval_secs),
        ),
        max_attempts: args.max_attempts.unwrap_or(config.max_attempts),
    };
    let ledger_path = args.ledger.unwrap_or_else(|| config.ledger.clone());
    let csv_path = args.csv.or_else(|| config.csv.clone());

    let orders = schedule.orders()?;
    if orders.is_empty() {
        return Err(anyhow!("schedule contains no orders"));
    }

    if args.dry_run {
        for order in &orders {
            println!(
                "{} {}",
                format_unix_date(order.start_date),
                client.describe_invoke(&target.call_for(order))
            );
        }
        info!("dry run: {} invocations planned, nothing sent", orders.len());
        return Ok(());
    }

    info!(
        orders = orders.len(),
        contract = %target.contract_address,
        "submitting order batch"
    );
    let outcome = submit_batch(client, &target, &orders, policy).await;

    if !outcome.ledger.is_empty() {
        outcome
            .ledger
            .append_to(&ledger_path, schedule.span_days())
            .context("failed to persist tx hashes")?;
        info!("> Created {}", ledger_path.display());
    }
    if let Some(path) = csv_path {
        write_csv_summary(&path, &orders, &outcome.ledger)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    match outcome.failure {
        Some(failure) => {
            warn!(
                submitted = outcome.ledger.len(),
                total = orders.len(),
                "batch stopped early"
            );
            Err(failure.into())
        }
        None => Ok(()),
    }
}

fn resolve_schedule(config: &BatchConfig, args: &SubmitArgs) -> Result<OrderSchedule> {
    let mut schedule = config.schedule.clone();
    if let Some(raw) = &args.base_date {
        schedule.base_date = parse_base_date(raw)?;
    }
    if let Some(days) = args.days {
        schedule.days = days;
    }
    let template = &mut schedule.template;
    template.amount = args.amount.unwrap_or(template.amount);
    template.price = args.price.unwrap_or(template.price);
    template.direction = args.direction.unwrap_or(template.direction);
    template.duration_days = args.duration_days.unwrap_or(template.duration_days);
    schedule
        .orders()
        .context("order dates overflow; check --base-date, --days and --duration-days")?;
    Ok(schedule)
}

async fn run_watch(client: &StarknetCli, args: WatchArgs) -> Result<()> {
    let mut hashes: Vec<TxHash> = Vec::new();
    if let Some(path) = &args.ledger {
        let ledger = HashLedger::load(path)?;
        hashes.extend(ledger.hashes());
    }
    hashes.extend(args.hashes.iter().map(TxHash::new));
    if hashes.is_empty() {
        return Err(anyhow!("nothing to watch: pass --hash or --ledger"));
    }

    info!("> Begin monitoring {} tx hashes", hashes.len());
    let rounds = poll_until_all_accepted(
        client,
        &hashes,
        Duration::from_secs(args.interval_secs),
        args.max_rounds,
    )
    .await?;
    info!(rounds, "watch finished");
    Ok(())
}
