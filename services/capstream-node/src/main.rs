//! Capstream node: wires the store, authentication gateway and payout
//! engine together and keeps expired auth state swept.
//!
//! HTTP routing is a separate concern layered on top of this composition;
//! the node itself only owns process lifecycle.

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use capstream_auth::{
    AuthGateway, Base64JsonCodec, ChallengeAuthenticator, ChallengeRegistry, ServerKeypair,
    SessionStore,
};
use capstream_core::{logging, Config};
use capstream_domain::{InvestorDirectory, SettlementLedger};
use capstream_settlement::ReportService;
use capstream_store::SqliteStore;

const NODE_PROTOCOL_VERSION: u32 = 1;

/// Interval between expiry sweeps of challenges and sessions.
const SWEEP_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Serialize)]
struct NodeVersionHandshake {
    version: &'static str,
    protocol_version: u32,
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|arg| arg == "--version-json") {
        let handshake = NodeVersionHandshake {
            version: env!("CARGO_PKG_VERSION"),
            protocol_version: NODE_PROTOCOL_VERSION,
        };
        println!("{}", serde_json::to_string(&handshake)?);
        return Ok(());
    }

    logging::init();

    let config = match parse_config_path(&args)? {
        Some(path) => Config::from_file(path)?,
        None => Config::default_config(),
    };

    let store = Arc::new(SqliteStore::open(&config.storage.db_path)?);
    let directory: Arc<dyn InvestorDirectory> = store.clone();
    let ledger: Arc<dyn SettlementLedger> = store.clone();

    let server_key = match &config.server.signing_key {
        Some(seed) => ServerKeypair::from_seed_hex(seed)
            .map_err(|e| anyhow::anyhow!("server signing key rejected: {e}"))?,
        None => {
            tracing::warn!("no signing key configured, using an ephemeral keypair");
            ServerKeypair::generate()
        }
    };

    let authenticator = ChallengeAuthenticator::new(
        ChallengeRegistry::new(config.auth.challenge_ttl_secs),
        server_key,
        Box::new(Base64JsonCodec),
        directory.clone(),
        config.server.network_passphrase.clone(),
    );
    let sessions = SessionStore::new(directory.clone(), config.auth.session_ttl_secs);
    let gateway = AuthGateway::new(directory.clone(), authenticator, sessions);

    let reports = ReportService::new(ledger, config.revenue.total_investment_pool);
    let overview = reports
        .revenue_overview()
        .map_err(|e| anyhow::anyhow!("settlement ledger unreadable: {e}"))?;

    tracing::info!(
        db_path = %config.storage.db_path,
        home_domain = %config.server.home_domain,
        settled_periods = overview.total_count,
        total_revenue = overview.total_revenue,
        session_ttl_secs = config.auth.session_ttl_secs,
        challenge_ttl_secs = config.auth.challenge_ttl_secs,
        "capstream node ready"
    );

    loop {
        thread::sleep(Duration::from_secs(SWEEP_INTERVAL_SECS));
        let report = gateway.sweep_expired();
        if report.challenges > 0 || report.sessions > 0 {
            tracing::info!(
                challenges = report.challenges,
                sessions = report.sessions,
                "swept expired auth state"
            );
        }
    }
}

fn parse_config_path(args: &[String]) -> anyhow::Result<Option<PathBuf>> {
    let mut args_iter = args.iter();
    while let Some(arg) = args_iter.next() {
        if arg == "--config" {
            if let Some(path) = args_iter.next() {
                return Ok(Some(PathBuf::from(path)));
            }
            anyhow::bail!("--config was provided without a path");
        }
    }
    Ok(None)
}
