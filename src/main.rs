//! Staking registry operator tool.
//!
//! Reads `ETH_*` environment variables (optionally layered over the TOML
//! file named by `STAKING_CONFIG`) and applies the requested operator
//! actions, waiting for each receipt:
//!
//! ```text
//! ETH_UPDATEAPPROVAL + ETH_APPROVALPERIOD  → setApprovalPeriod
//! ETH_UPDATEMINSTAKE + ETH_MINSTAKE        → setSelfMinStake
//! ETH_SLASHED (comma separated addresses)  → slash, one per address
//! ```
//!
//! Failures map to the exit codes in `lifecycle::exit`.

use std::process::ExitCode;

use staking_client::config::validation::{parse_address, parse_amount, parse_duration};
use staking_client::config::{self, OperatorConfig};
use staking_client::lifecycle::{exit_code, signals, AppError, Shutdown};
use staking_client::observability::logging;
use staking_client::staking::contract::AlloyStakingLedger;
use staking_client::{StakingClient, Wallet};

#[tokio::main]
async fn main() -> ExitCode {
    let shutdown = Shutdown::new();
    signals::install(shutdown.clone());
    exit_code(shutdown.run_until_triggered(run(&shutdown)).await)
}

async fn run(shutdown: &Shutdown) -> Result<(), AppError> {
    let config = config::load()?;
    logging::init(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        rpc_url = %config.blockchain.rpc_url,
        contract = %config.blockchain.contract_address,
        "staking-client starting"
    );

    let client = StakingClient::connect(&config).await?;

    if !config.operator.has_actions() {
        let bonded = client.bonded_transcoders().await?;
        tracing::info!(bonded = bonded.len(), "No operator actions requested");
        return Ok(());
    }

    let wallet = client.wallet(&config.wallet).await?;
    apply_operator_actions(&client, &wallet, &config.operator, shutdown).await?;

    tracing::info!("Operator actions complete");
    Ok(())
}

async fn apply_operator_actions(
    client: &StakingClient<AlloyStakingLedger>,
    wallet: &Wallet,
    operator: &OperatorConfig,
    shutdown: &Shutdown,
) -> Result<(), AppError> {
    // Parse everything before sending the first transaction.
    let approval_period = operator
        .approval_period
        .as_deref()
        .filter(|_| operator.update_approval)
        .map(parse_duration)
        .transpose()
        .map_err(AppError::Usage)?;
    let min_stake = operator
        .min_stake
        .as_deref()
        .filter(|_| operator.update_min_stake)
        .map(parse_amount)
        .transpose()
        .map_err(AppError::Usage)?;
    let slashed = operator
        .slashed
        .iter()
        .map(|raw| parse_address(raw).map_err(AppError::Usage))
        .collect::<Result<Vec<_>, _>>()?;

    let control = shutdown.wait_control(None);

    if let Some(period) = approval_period {
        let receipt = client.set_approval_period(wallet, period, &control).await?;
        tracing::info!(
            period_secs = period.as_secs(),
            tx_hash = %receipt.tx_hash,
            "Approval period updated"
        );
    }

    if let Some(amount) = min_stake {
        let receipt = client.set_self_min_stake(wallet, amount, &control).await?;
        tracing::info!(amount = %amount, tx_hash = %receipt.tx_hash, "Minimum self stake updated");
    }

    for transcoder in slashed {
        let receipt = client.slash(wallet, transcoder, &control).await?;
        tracing::info!(transcoder = %transcoder, tx_hash = %receipt.tx_hash, "Transcoder slashed");
    }

    Ok(())
}
