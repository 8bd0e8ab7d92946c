//! Query and delegator CLI for the staking registry.
//!
//! Connection settings come from the same `ETH_*` variables (and optional
//! `STAKING_CONFIG` file) as the operator tool; `--url` and `--contract`
//! override them. Every command prints pretty JSON on success and exits with
//! the codes in `lifecycle::exit` on failure. Ctrl-C cancels the running
//! command with status 130.

use std::process::ExitCode;
use std::time::Duration;

use alloy::primitives::{Address, U256};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;

use staking_client::config::validation::{parse_address, parse_amount, validate_config};
use staking_client::config::{self, ConfigError, StakingConfig};
use staking_client::lifecycle::{exit_code, signals, AppError, Shutdown};
use staking_client::observability::logging;
use staking_client::staking::contract::AlloyStakingLedger;
use staking_client::{StakingClient, Wallet};

#[derive(Parser)]
#[command(name = "staking-cli")]
#[command(about = "Query and delegator CLI for the staking registry", long_about = None)]
struct Cli {
    /// JSON-RPC endpoint (overrides ETH_URL)
    #[arg(short, long)]
    url: Option<String>,

    /// StakingManager address (overrides ETH_CONTRACT)
    #[arg(short, long)]
    contract: Option<String>,

    /// Give up waiting after this many seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every registered transcoder
    Transcoders,
    /// List bonded transcoders
    Bonded,
    /// Show one transcoder
    Transcoder { address: String },
    /// Show the bonding state of an address
    State { address: String },
    /// Show the pending withdrawal of an address (defaults to the wallet)
    Pending { address: Option<String> },
    /// Register the wallet as a transcoder
    Register { capacity: String },
    /// Delegate stake to a transcoder
    Delegate { transcoder: String, amount: String },
    /// Request a withdrawal from a transcoder
    RequestWithdrawal { transcoder: String, amount: String },
    /// Complete the wallet's ready withdrawals
    CompleteWithdrawals,
    /// Wait until the wallet's withdrawal is ready and complete it
    WaitWithdrawal,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let shutdown = Shutdown::new();
    signals::install(shutdown.clone());
    exit_code(shutdown.run_until_triggered(run(cli, &shutdown)).await)
}

async fn run(cli: Cli, shutdown: &Shutdown) -> Result<(), AppError> {
    let config = load_config(&cli)?;
    logging::init(&config.observability);

    let control = shutdown.wait_control(cli.timeout.map(Duration::from_secs));

    let client = StakingClient::connect(&config).await?;

    match cli.command {
        Commands::Transcoders => print_json(&client.all_transcoders().await?),
        Commands::Bonded => print_json(&client.bonded_transcoders().await?),
        Commands::Transcoder { address } => print_json(&client.transcoder(address_arg(&address)?).await?),
        Commands::State { address } => {
            let address = address_arg(&address)?;
            let state = client.transcoder_state(address).await?;
            print_json(&json!({ "address": address, "state": state }))
        }
        Commands::Pending { address } => {
            let address = match address {
                Some(raw) => address_arg(&raw)?,
                None => wallet(&client, &config).await?.address(),
            };
            let pending = client.pending_withdrawal(address).await?;
            print_json(&json!({
                "address": address,
                "amount": pending.amount,
                "readiness_timestamp": pending.readiness_timestamp,
            }))
        }
        Commands::Register { capacity } => {
            let wallet = wallet(&client, &config).await?;
            let receipt = client
                .register_transcoder(&wallet, amount_arg(&capacity)?, &control)
                .await?;
            print_json(&json!({ "tx_hash": receipt.tx_hash, "block": receipt.block_number }))
        }
        Commands::Delegate { transcoder, amount } => {
            let wallet = wallet(&client, &config).await?;
            let receipt = client
                .delegate(&wallet, address_arg(&transcoder)?, amount_arg(&amount)?, &control)
                .await?;
            print_json(&json!({ "tx_hash": receipt.tx_hash, "block": receipt.block_number }))
        }
        Commands::RequestWithdrawal { transcoder, amount } => {
            let wallet = wallet(&client, &config).await?;
            let info = client
                .request_withdrawal(&wallet, address_arg(&transcoder)?, amount_arg(&amount)?, &control)
                .await?;
            print_json(&info)
        }
        Commands::CompleteWithdrawals => {
            let wallet = wallet(&client, &config).await?;
            print_json(&client.complete_withdrawals(&wallet, &control).await?)
        }
        Commands::WaitWithdrawal => {
            let wallet = wallet(&client, &config).await?;
            print_json(&client.wait_withdrawal_completed(&wallet, &control).await?)
        }
    }
}

fn load_config(cli: &Cli) -> Result<StakingConfig, AppError> {
    let mut config = config::load_unvalidated()?;
    if let Some(url) = &cli.url {
        config.blockchain.rpc_url = url.clone();
    }
    if let Some(contract) = &cli.contract {
        config.blockchain.contract_address = contract.clone();
    }
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

async fn wallet(client: &StakingClient<AlloyStakingLedger>, config: &StakingConfig) -> Result<Wallet, AppError> {
    Ok(client.wallet(&config.wallet).await?)
}

fn address_arg(raw: &str) -> Result<Address, AppError> {
    parse_address(raw).map_err(AppError::Usage)
}

fn amount_arg(raw: &str) -> Result<U256, AppError> {
    parse_amount(raw).map_err(AppError::Usage)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
