//! farmhand - yield farm dashboard and harvester
//!
//! Run with: cargo run -- stats
//!
//! Reads protocol and account metrics through the query cache, and submits
//! harvest/approve actions when a signer key is configured.

use alloy_primitives::Address;
use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use farmhand::actions::{ActionId, ActionRecord, ActionStatus, InvokeOutcome};
use farmhand::chain::{ChainTransport, RpcTransport};
use farmhand::client::{PresalePhase, ProtocolClient};
use farmhand::config::{ActionLog, Config};
use farmhand::networks::{NetworkCatalog, PoolCategory};
use farmhand::registry::ContractRegistry;
use farmhand::session::SessionContext;

#[derive(Parser, Debug)]
#[command(name = "farmhand")]
#[command(about = "Yield farm metrics and harvesting from the command line")]
struct Args {
    /// TOML configuration file (environment is used when omitted)
    #[arg(short, long)]
    config: Option<String>,

    /// Override the configured chain id
    #[arg(long)]
    chain_id: Option<u64>,

    /// Override the configured account
    #[arg(short, long)]
    account: Option<String>,

    /// Print machine-readable JSON instead of tables
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Protocol TVL and reward token supply
    Stats,
    /// Per-pool snapshots with APR and the account's position
    Pools {
        /// Show farms instead of pools
        #[arg(long)]
        farms: bool,
    },
    /// Reward tokens in wallet and waiting to be harvested
    Wallet,
    /// Presale schedule and countdown
    Presale,
    /// Referrer and referral count of the account
    Referral,
    /// Claim rewards from every pool with something pending
    HarvestAll,
    /// Claim rewards from one pool
    Harvest { pid: u64 },
    /// Approve the staking contract for a pool's LP token
    Approve { pid: u64 },
    /// Supported networks and their endpoints
    Networks,
    /// Print the effective configuration
    Config,
}

fn print_banner() {
    println!();
    println!(
        "{}",
        style("═══════════════════════════════════════════════════════════════").cyan()
    );
    println!("{}", style(" 🌾 FARMHAND - Yield Farm Client").cyan().bold());
    println!(
        "{}",
        style("    Pools | Farms | Rewards | Harvest").cyan()
    );
    println!(
        "{}",
        style("═══════════════════════════════════════════════════════════════").cyan()
    );
    println!();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn stale_marker(stale: bool) -> String {
    if stale {
        style(" (stale)").yellow().to_string()
    } else {
        String::new()
    }
}

fn spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        bar.set_style(template);
    }
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let directive = if args.verbose { "farmhand=debug" } else { "farmhand=info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive.parse()?))
        .init();

    // Load configuration
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    if let Some(chain_id) = args.chain_id {
        config.chain_id = chain_id;
    }
    if let Some(account) = &args.account {
        config.account = Some(account.clone());
    }

    let networks = Arc::new(NetworkCatalog::builtin());
    let registry = Arc::new(ContractRegistry::builtin());
    registry.validate_coverage(&networks.ids())?;

    // Validate configuration
    if let Err(e) = config.validate(&networks) {
        error!("Configuration validation failed: {}", e);
        error!("Please check your .env file");
        return Err(e);
    }

    if !args.json {
        print_banner();
    }

    match args.command {
        Command::Config => {
            config.print_summary(&networks);
            return Ok(());
        }
        Command::Networks => return show_networks(&networks, args.json),
        _ => {}
    }

    let network = networks.get(config.chain_id)?;
    let rpc_url = config.resolved_rpc_url(network)?;

    let (transport, signer): (Arc<dyn ChainTransport>, Option<Address>) = match &config.signer_key {
        Some(key) => {
            let signer = RpcTransport::parse_signer(key)?;
            let address = signer.address();
            let transport = RpcTransport::with_signer(
                &rpc_url,
                signer,
                config.request_timeout(),
                config.confirmation_timeout(),
            )?;
            (Arc::new(transport), Some(address))
        }
        None => (Arc::new(RpcTransport::new(&rpc_url, config.request_timeout())?), None),
    };

    let account = config.account_address()?.or(signer);
    info!("🔗 {} via {}", network.chain_name, rpc_url);

    let client = ProtocolClient::new(
        transport,
        registry,
        networks.clone(),
        SessionContext::new(config.chain_id, account),
        config.stale_after(),
    )?;

    match args.command {
        Command::Stats => show_stats(&client, args.json).await,
        Command::Pools { farms } => {
            let category = if farms { PoolCategory::Farm } else { PoolCategory::Pool };
            show_pools(&client, category, args.json).await
        }
        Command::Wallet => show_wallet(&client, args.json).await,
        Command::Presale => show_presale(&client, args.json).await,
        Command::Referral => show_referral(&client, args.json).await,
        Command::HarvestAll => {
            let bar = spinner("Harvesting all pools...".to_string());
            let outcome = client.harvest_all().await;
            bar.finish_and_clear();
            report_action(&client, &config, ActionId::HarvestAll, outcome?, args.json).await
        }
        Command::Harvest { pid } => {
            let bar = spinner(format!("Harvesting pool {}...", pid));
            let outcome = client.harvest(pid).await;
            bar.finish_and_clear();
            report_action(&client, &config, ActionId::Harvest(pid), outcome?, args.json).await
        }
        Command::Approve { pid } => {
            let bar = spinner(format!("Approving pool {}...", pid));
            let outcome = client.approve(pid).await;
            bar.finish_and_clear();
            report_action(&client, &config, ActionId::Approve(pid), outcome?, args.json).await
        }
        Command::Networks | Command::Config => Ok(()),
    }
}

// =============================================
// READ COMMANDS
// =============================================

fn show_networks(networks: &NetworkCatalog, json: bool) -> Result<()> {
    let all: Vec<_> = networks.iter().collect();
    if json {
        return print_json(&all);
    }

    for network in all {
        println!(
            "{} {} ({})",
            style("●").green(),
            style(network.chain_name).bold(),
            network.chain_id
        );
        println!("    Native:   {} ({} decimals)", network.native_currency.symbol, network.native_currency.decimals);
        println!("    RPC:      {}", network.rpc_urls.join(", "));
        println!("    Explorer: {}", network.block_explorer_urls.join(", "));
        println!("    Pools:    {:?}  Farms: {:?}", network.pool_ids, network.farm_ids);
    }
    Ok(())
}

async fn show_stats(client: &ProtocolClient, json: bool) -> Result<()> {
    let (tvl, supply) = tokio::join!(client.protocol_stats(), client.reward_token_stats());
    let tvl = tvl?;
    let supply = supply?;

    if json {
        #[derive(Serialize)]
        struct Stats<'a> {
            protocol: &'a farmhand::aggregation::ProtocolSnapshot,
            reward_token: &'a farmhand::client::TokenStats,
        }
        return print_json(&Stats {
            protocol: &tvl.value,
            reward_token: &supply.value,
        });
    }

    println!("{}", style("═══ PROTOCOL ═══").blue().bold());
    println!("  Total value locked: ${:.2}{}", tvl.value.total_value_locked, stale_marker(tvl.stale));
    println!("  • In pools:         ${:.2}", tvl.value.value_in_pools);
    println!("  • In farms:         ${:.2}", tvl.value.value_in_farms);
    for failure in &tvl.value.failures {
        println!("  {} pool {} unavailable: {}", style("⚠").yellow(), failure.pid, failure.error);
    }

    println!();
    println!("{}", style("═══ REWARD TOKEN ═══").magenta().bold());
    println!("  Max supply:   {}{}", supply.value.max_supply.to_decimal_string(), stale_marker(supply.stale));
    println!("  Minted:       {}", supply.value.total_minted.to_decimal_string());
    println!("  Burned:       {}", supply.value.total_burned.to_decimal_string());
    println!("  Circulating:  {}", supply.value.circulating.to_decimal_string());
    Ok(())
}

async fn show_pools(client: &ProtocolClient, category: PoolCategory, json: bool) -> Result<()> {
    let pools = client.pools(category).await?;

    if json {
        let snapshots: Vec<_> = pools
            .iter()
            .filter_map(|(_, result)| result.as_ref().ok().map(|cached| (*cached.value).clone()))
            .collect();
        return print_json(&snapshots);
    }

    println!("{}", style(format!("═══ {}S ═══", category.to_string().to_uppercase())).green().bold());
    for (pid, result) in pools {
        match result {
            Ok(cached) => {
                let pool = &cached.value;
                println!(
                    "  #{:<2} {:<20} {:>3}x  fee {:>5.2}%  TVL ${:<14.2} APR {:>9.2}%  APY {:>10.2}%{}",
                    pid,
                    pool.label,
                    pool.multiplier,
                    pool.deposit_fee_bps as f64 / 100.0,
                    pool.value_locked,
                    pool.apr,
                    pool.apy,
                    stale_marker(cached.stale)
                );
                if pool.user.has_staked() || !pool.user.pending_reward.is_zero() {
                    println!(
                        "       staked {}  earned {}  {}",
                        pool.user.staked.to_decimal_string(),
                        pool.user.pending_reward.to_decimal_string(),
                        if pool.user.approved { style("approved").green() } else { style("not approved").yellow() }
                    );
                }
            }
            Err(e) => println!("  #{:<2} {} {}", pid, style("✗").red(), e),
        }
    }
    Ok(())
}

async fn show_wallet(client: &ProtocolClient, json: bool) -> Result<()> {
    let (reward, secondary, to_harvest, secondary_to_harvest) = tokio::join!(
        client.reward_in_wallet(),
        client.secondary_in_wallet(),
        client.reward_to_harvest(),
        client.secondary_to_harvest(),
    );
    let (reward, secondary, to_harvest, secondary_to_harvest) =
        (reward?, secondary?, to_harvest?, secondary_to_harvest?);

    if json {
        return print_json(&serde_json::json!({
            "reward_in_wallet": *reward.value,
            "secondary_in_wallet": *secondary.value,
            "reward_to_harvest": *to_harvest.value,
            "secondary_to_harvest": *secondary_to_harvest.value,
        }));
    }

    if client.context().await.account.is_none() {
        warn!("No account configured, showing defaults");
    }

    println!("{}", style("═══ WALLET ═══").cyan().bold());
    println!("  Reward in wallet:        {}{}", reward.value.to_decimal_string(), stale_marker(reward.stale));
    println!("  Reward to harvest:       {}{}", to_harvest.value.total.to_decimal_string(), stale_marker(to_harvest.stale));
    println!("  Secondary in wallet:     {}{}", secondary.value.to_decimal_string(), stale_marker(secondary.stale));
    println!(
        "  Secondary to harvest:    {}{}",
        secondary_to_harvest.value.total.to_decimal_string(),
        stale_marker(secondary_to_harvest.stale)
    );
    Ok(())
}

async fn show_presale(client: &ProtocolClient, json: bool) -> Result<()> {
    let presale = client.presale_info().await?;
    if json {
        return print_json(&*presale.value);
    }

    let info = &presale.value;
    println!("{}", style("═══ PRESALE ═══").yellow().bold());
    println!("  Blocks:  {} → {} (now {})", info.start_block, info.end_block, info.current_block);
    match info.phase {
        PresalePhase::Upcoming => {
            let t = info.starts_in;
            println!(
                "  Starts in {} days, {} hours, {:02} minutes, {:02} seconds",
                t.days, t.hours, t.minutes, t.seconds
            );
        }
        PresalePhase::Live => println!("  {}", style("Live now").green().bold()),
        PresalePhase::Ended => println!("  {}", style("Ended").red()),
    }
    Ok(())
}

async fn show_referral(client: &ProtocolClient, json: bool) -> Result<()> {
    let referral = client.referral_info().await?;
    if json {
        return print_json(&*referral.value);
    }

    println!("{}", style("═══ REFERRAL ═══").cyan().bold());
    match referral.value.referrer {
        Some(referrer) => println!("  Referred by: {:?}", referrer),
        None => println!("  Referred by: -"),
    }
    println!("  Referrals:   {}", referral.value.referrals);
    Ok(())
}

// =============================================
// ACTIONS
// =============================================

async fn report_action(
    client: &ProtocolClient,
    config: &Config,
    id: ActionId,
    outcome: InvokeOutcome,
    json: bool,
) -> Result<()> {
    let record: ActionRecord = match outcome {
        InvokeOutcome::AlreadyPending => {
            println!("{} {} is already pending", style("⏳").yellow(), id);
            return Ok(());
        }
        InvokeOutcome::Finished(record) => record,
    };

    if config.action_log {
        let ctx = client.context().await;
        let log = ActionLog {
            timestamp: chrono::Utc::now(),
            chain_id: ctx.network,
            account: ctx.account,
            action: id,
            record: record.clone(),
        };
        if let Err(e) = log.append_to_file(&config.action_log_path) {
            warn!("Could not write action log: {}", e);
        }
    }

    if json {
        return print_json(&record);
    }

    match record.status {
        ActionStatus::Success => {
            println!("{} {} confirmed", style("✓").green(), id);
            for receipt in &record.receipts {
                println!("    tx {:?} (block {:?}, gas {})", receipt.tx_hash, receipt.block_number, receipt.gas_used);
            }
            if record.receipts.is_empty() {
                println!("    nothing to claim");
            }
        }
        ActionStatus::Failed => {
            let cause = record.error.map(|e| e.to_string()).unwrap_or_default();
            println!("{} {} failed: {}", style("✗").red(), id, cause);
        }
        ActionStatus::Idle | ActionStatus::Pending => {}
    }
    Ok(())
}
