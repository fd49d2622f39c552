//! Runtime configuration for farmhand
//!
//! Loaded once at startup from the environment (and `.env`), or from a TOML
//! file. Network and contract tables are compiled in; this only selects the
//! network, the endpoint, the account and the cache/timeout knobs.

use alloy_primitives::Address;
use eyre::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::chain::RpcTransport;
use crate::networks::{NetworkCatalog, NetworkInfo, FANTOM};

// ============================================
// MAIN CONFIGURATION
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // ========== Network Settings ==========
    /// Chain to start on (250 = Fantom)
    pub chain_id: u64,

    /// Overrides the network's default RPC endpoint
    pub rpc_url: Option<String>,

    // ========== Session Settings ==========
    /// Account to read user metrics for; anonymous when unset
    pub account: Option<String>,

    /// Key used to sign actions (KEEP SECRET!). Never written back to disk.
    #[serde(skip_serializing, default)]
    pub signer_key: Option<String>,

    // ========== Cache Settings ==========
    /// Seconds a fetched metric stays fresh
    pub stale_after_secs: u64,

    // ========== Transport Settings ==========
    pub request_timeout_secs: u64,

    /// How long to wait for a submitted transaction to be mined
    pub confirmation_timeout_secs: u64,

    // ========== Action Journal ==========
    pub action_log: bool,
    pub action_log_path: String,
}

impl Config {
    /// Load configuration from environment variables and .env file
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            chain_id: env::var("CHAIN_ID")
                .unwrap_or_else(|_| FANTOM.to_string())
                .parse()
                .unwrap_or(FANTOM),
            rpc_url: env::var("RPC_URL").ok().filter(|s| !s.is_empty()),

            account: env::var("ACCOUNT").ok().filter(|s| !s.is_empty()),
            signer_key: env::var("SIGNER_KEY")
                .or_else(|_| env::var("PRIVATE_KEY"))
                .ok()
                .filter(|s| !s.is_empty()),

            stale_after_secs: env::var("STALE_AFTER_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),

            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
            confirmation_timeout_secs: env::var("CONFIRMATION_TIMEOUT_SECS")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .unwrap_or(120),

            action_log: env::var("ACTION_LOG")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
            action_log_path: env::var("ACTION_LOG_PATH")
                .unwrap_or_else(|_| "./logs/actions.log".to_string()),
        })
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file (the signer key is left out)
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Parsed `account`, if set
    pub fn account_address(&self) -> Result<Option<Address>> {
        self.account
            .as_deref()
            .map(|s| Address::from_str(s.trim()).map_err(|e| eyre::eyre!("Invalid ACCOUNT {}: {}", s, e)))
            .transpose()
    }

    /// Explicit override, else the network's first public endpoint
    pub fn resolved_rpc_url(&self, network: &NetworkInfo) -> Result<String> {
        match (&self.rpc_url, network.default_rpc_url()) {
            (Some(url), _) => Ok(url.clone()),
            (None, Some(url)) => Ok(url.to_string()),
            (None, None) => Err(eyre::eyre!("No RPC_URL set and network {} has no default", network.chain_id)),
        }
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }

    /// Validate configuration against the supported networks
    pub fn validate(&self, networks: &NetworkCatalog) -> Result<()> {
        let network = networks
            .get(self.chain_id)
            .map_err(|_| eyre::eyre!("Unsupported CHAIN_ID {} (supported: {:?})", self.chain_id, networks.ids()))?;

        let rpc_url = self.resolved_rpc_url(network)?;
        if rpc_url.is_empty() || rpc_url.contains("YOUR_API_KEY") {
            return Err(eyre::eyre!("Invalid RPC_URL - please set a reachable endpoint"));
        }

        let account = self.account_address()?;

        if let Some(key) = &self.signer_key {
            let signer = RpcTransport::parse_signer(key).map_err(|e| eyre::eyre!("SIGNER_KEY: {}", e))?;
            if let Some(account) = account {
                if signer.address() != account {
                    return Err(eyre::eyre!(
                        "SIGNER_KEY belongs to {:?}, not ACCOUNT {:?}",
                        signer.address(),
                        account
                    ));
                }
            }
        }

        if self.request_timeout_secs == 0 {
            return Err(eyre::eyre!("REQUEST_TIMEOUT_SECS must be at least 1"));
        }
        if self.confirmation_timeout_secs < self.request_timeout_secs {
            return Err(eyre::eyre!(
                "CONFIRMATION_TIMEOUT_SECS ({}) is shorter than REQUEST_TIMEOUT_SECS ({})",
                self.confirmation_timeout_secs,
                self.request_timeout_secs
            ));
        }

        Ok(())
    }

    /// Print configuration summary
    pub fn print_summary(&self, networks: &NetworkCatalog) {
        let chain_name = networks.get(self.chain_id).map(|n| n.chain_name).unwrap_or("unknown");
        let account = self.account.as_deref().unwrap_or("anonymous");

        println!("╔════════════════════════════════════════════════════════════╗");
        println!("║                 FARMHAND - CONFIGURATION                   ║");
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ Network:           {:^40} ║", format!("{} ({})", chain_name, self.chain_id));
        println!("║ RPC Override:      {:^40} ║",
            if self.rpc_url.is_some() { "✓ Configured" } else { "✗ Network default" }
        );
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ SESSION                                                    ║");
        println!("║ • Account:         {:^40} ║", shorten(account));
        println!("║ • Signer Key:      {:^40} ║",
            if self.signer_key.is_some() { "✓ Configured" } else { "✗ Read only" }
        );
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ CACHE + TRANSPORT                                          ║");
        println!("║ • Stale After:     {:>38}s ║", self.stale_after_secs);
        println!("║ • Request Timeout: {:>38}s ║", self.request_timeout_secs);
        println!("║ • Confirm Timeout: {:>38}s ║", self.confirmation_timeout_secs);
        println!("║ • Action Log:      {:^40} ║",
            if self.action_log { "✓ Enabled" } else { "✗ Disabled" }
        );
        println!("╚════════════════════════════════════════════════════════════╝");
    }
}

fn shorten(s: &str) -> String {
    if s.len() > 20 {
        format!("{}…{}", &s[..8], &s[s.len() - 6..])
    } else {
        s.to_string()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chain_id: FANTOM,
            rpc_url: None,
            account: None,
            signer_key: None,
            stale_after_secs: 30,
            request_timeout_secs: 10,
            confirmation_timeout_secs: 120,
            action_log: true,
            action_log_path: "./logs/actions.log".to_string(),
        }
    }
}

// ============================================
// ACTION JOURNAL
// ============================================

use chrono::{DateTime, Utc};
use std::io::Write;

use crate::actions::{ActionId, ActionRecord};

/// One line per finished action
#[derive(Debug, Clone, Serialize)]
pub struct ActionLog {
    pub timestamp: DateTime<Utc>,
    pub chain_id: u64,
    pub account: Option<Address>,
    pub action: ActionId,
    pub record: ActionRecord,
}

impl ActionLog {
    /// Append this log to a file
    pub fn append_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        // Create parent directories if needed
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;

        let json = serde_json::to_string(self)?;
        writeln!(file, "{}", json)?;

        Ok(())
    }
}

// ============================================
// TESTS
// ============================================
