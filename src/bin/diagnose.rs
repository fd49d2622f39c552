//! Diagnostic tool - Check configuration and built-in tables
//!
//! Run with: cargo run --bin diagnose

use std::env;

use farmhand::chain::RpcTransport;
use farmhand::config::Config;
use farmhand::networks::NetworkCatalog;
use farmhand::registry::{ContractName, ContractRegistry};

fn main() {
    println!("🔍 FARMHAND DIAGNOSTIC CHECK\n");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            println!("  ❌ Could not load configuration: {}", e);
            return;
        }
    };
    let networks = NetworkCatalog::builtin();
    let registry = ContractRegistry::builtin();

    println!("═══════════════════════════════════════════════════");
    println!("                  CONFIGURATION                     ");
    println!("═══════════════════════════════════════════════════\n");

    let checks = [
        ("CHAIN_ID", "250", "Network to start on"),
        ("STALE_AFTER_SECS", "30", "Seconds a metric stays fresh"),
        ("REQUEST_TIMEOUT_SECS", "10", "Per-read timeout"),
        ("CONFIRMATION_TIMEOUT_SECS", "120", "Wait for a transaction to be mined"),
        ("ACTION_LOG", "true", "Journal finished actions?"),
    ];

    for (key, default, desc) in checks {
        let value = env::var(key).unwrap_or_else(|_| default.to_string());
        let marker = if env::var(key).is_err() { "(default)" } else { "(from .env)" };
        println!("  {}: {} {}", key, value, marker);
        println!("    └─ {}\n", desc);
    }

    let rpc = config.rpc_url.clone().unwrap_or_else(|| "network default".to_string());
    let rpc_display = if rpc.len() > 50 {
        format!("{}...{}", &rpc[..30], &rpc[rpc.len() - 15..])
    } else {
        rpc
    };
    println!("  RPC_URL: {}", rpc_display);

    println!("\n═══════════════════════════════════════════════════");
    println!("                    NETWORKS                        ");
    println!("═══════════════════════════════════════════════════\n");

    for network in networks.iter() {
        let marker = if network.chain_id == config.chain_id { "▶" } else { " " };
        println!(
            "  {} {} ({}): {} pools, {} farms, block {:.1}s",
            marker,
            network.chain_name,
            network.chain_id,
            network.pool_ids.len(),
            network.farm_ids.len(),
            network.block_time_secs
        );
        for name in ContractName::ALL {
            match registry.resolve(name, network.chain_id) {
                Ok(handle) => println!("      {:<22} {:?}", name.to_string(), handle.address),
                Err(_) => println!("      {:<22} ❌ missing", name.to_string()),
            }
        }
    }

    match registry.validate_coverage(&networks.ids()) {
        Ok(()) => println!("\n  ✅ Every contract is registered on every network"),
        Err(e) => println!("\n  ⚠️  {}", e),
    }

    println!("\n═══════════════════════════════════════════════════");
    println!("                     SESSION                        ");
    println!("═══════════════════════════════════════════════════\n");

    match config.account_address() {
        Ok(Some(account)) => println!("  ACCOUNT:    ✅ {:?}", account),
        Ok(None) => println!("  ACCOUNT:    ➖ Not set (anonymous reads)"),
        Err(e) => println!("  ACCOUNT:    ❌ {}", e),
    }

    match config.signer_key.as_deref().map(RpcTransport::parse_signer) {
        Some(Ok(signer)) => {
            println!("  SIGNER_KEY: ✅ Set ({:?})", signer.address());
            println!("     → harvest-all, harvest and approve are available");
        }
        Some(Err(e)) => println!("  SIGNER_KEY: ❌ {}", e),
        None => {
            println!("  SIGNER_KEY: ➖ Not set");
            println!("     → Read-only: actions will be rejected");
        }
    }

    match config.validate(&networks) {
        Ok(()) => println!("\n✅ Diagnostic complete!\n"),
        Err(e) => println!("\n⚠️  Configuration will be rejected: {}\n", e),
    }
}
