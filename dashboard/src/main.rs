//! # Dashboard Binary
//!
//! Runs the data core standalone: polls the live sources, drives a local
//! keypair signer, and logs each published snapshot until Ctrl-C.

use dashboard::{Dashboard, DashboardConfig, LiveMarketData, LocalKeypairSigner, WalletSession};
use lib_solana::{JupiterPriceClient, SolanaClient};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("dashboard=info,lib_solana=info,warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(" SOLANA DASHBOARD DATA CORE STARTING");

    let config = DashboardConfig::from_env().map_err(|e| anyhow::anyhow!(e))?;
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    let mut solana_builder = SolanaClient::builder().network(config.network.clone());
    if let Some(key) = config.helius_api_key.clone() {
        solana_builder = solana_builder.helius_api_key(key);
    }
    if let Some(url) = config.custom_rpc_url.clone() {
        solana_builder = solana_builder.custom_rpc_url(url);
    }
    let solana = Arc::new(solana_builder.build());

    // A failed startup check is worth a warning, not an abort; the poller
    // flags the source degraded and recovers when the endpoint does.
    if let Err(e) = solana.health_check().await {
        warn!(error = %e, "Solana RPC health check failed");
    }

    let jupiter = JupiterPriceClient::builder()
        .price_api_base(config.price_api_base.clone())
        .build()?;

    let api = Arc::new(LiveMarketData::new(
        jupiter,
        Arc::clone(&solana),
        config.price_mint.clone(),
    ));

    let signer: Arc<LocalKeypairSigner> = match config.keypair_path.clone() {
        Some(path) => Arc::new(LocalKeypairSigner::from_file(path)),
        None => Arc::new(LocalKeypairSigner::ephemeral()),
    };

    let dashboard = Dashboard::start(&config, api, signer);

    // With a configured keypair the wallet connects right away; an
    // ephemeral signer waits for an explicit trigger.
    if config.keypair_path.is_some() {
        dashboard.connect_wallet().await;
    }

    let mut snapshots = dashboard.subscribe();
    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                log_snapshot(&snapshots.borrow_and_update());
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
        }
    }

    dashboard.disconnect_wallet().await;
    dashboard.shutdown();
    Ok(())
}

fn log_snapshot(snapshot: &dashboard::ViewSnapshot) {
    let wallet = match &snapshot.wallet {
        WalletSession::Connected {
            account_id,
            balance,
        } => match balance {
            Some(sol) => format!("{} ({:.4} SOL)", account_id, sol),
            None => account_id.clone(),
        },
        WalletSession::Connecting => "connecting".to_string(),
        WalletSession::Failed { reason } => format!("failed: {}", reason),
        WalletSession::Disconnected => "disconnected".to_string(),
    };

    info!(
        price = ?snapshot.price.price,
        tps = ?snapshot.network.as_ref().map(|n| n.transactions_per_second),
        slot = ?snapshot.network.as_ref().map(|n| n.current_slot),
        wallet = %wallet,
        degraded = snapshot.sources.price.degraded
            || snapshot.sources.network.degraded
            || snapshot.sources.balance.degraded,
        "snapshot"
    );
}
