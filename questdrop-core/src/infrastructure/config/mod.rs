//! Layered configuration. Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. TOML config file
//! 3. Environment variables (QUESTDROP_* prefix, `__` as section separator)

use crate::foundation::{QuestDropError, Result};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const ENV_PREFIX: &str = "QUESTDROP_";
const DEFAULT_CONFIG_FILE: &str = "questdrop-config.toml";
const DEFAULT_RPC_ADDR: &str = "127.0.0.1:8090";
const DEFAULT_SEAL_DEADLINE_SECS: u64 = 60;
const DEFAULT_CALL_TIMEOUT_SECS: u64 = 15;
const DEFAULT_CLAIM_TTL_SECS: u64 = 120;
const DEFAULT_RECONCILE_MAX_IN_FLIGHT: usize = 8;
const DEFAULT_RETRY_ATTEMPTS: usize = 3;
const DEFAULT_RETRY_DELAY_MS: u64 = 250;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub data_dir: String,
    /// Directory for rolling log files; empty disables file logging.
    #[serde(default)]
    pub log_dir: String,
    /// Per-module log filters, e.g. "info,questdrop_core=debug".
    #[serde(default)]
    pub log_filters: String,
    /// How long to wait for ledger finality before a submission is treated as
    /// outcome-unknown.
    #[serde(default = "default_seal_deadline_secs")]
    pub seal_deadline_secs: u64,
    /// Per-request timeout for the store and ledger HTTP clients.
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
    /// How long an in-flight mutation claim stays exclusive before a crashed
    /// holder's claim can be taken over.
    #[serde(default = "default_claim_ttl_secs")]
    pub claim_ttl_secs: u64,
    /// Concurrency cap for bulk reconciliation.
    #[serde(default = "default_reconcile_max_in_flight")]
    pub reconcile_max_in_flight: usize,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: usize,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_seal_deadline_secs() -> u64 {
    DEFAULT_SEAL_DEADLINE_SECS
}
fn default_call_timeout_secs() -> u64 {
    DEFAULT_CALL_TIMEOUT_SECS
}
fn default_claim_ttl_secs() -> u64 {
    DEFAULT_CLAIM_TTL_SECS
}
fn default_reconcile_max_in_flight() -> usize {
    DEFAULT_RECONCILE_MAX_IN_FLIGHT
}
fn default_retry_attempts() -> usize {
    DEFAULT_RETRY_ATTEMPTS
}
fn default_retry_delay_ms() -> u64 {
    DEFAULT_RETRY_DELAY_MS
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: String::new(),
            log_dir: String::new(),
            log_filters: String::new(),
            seal_deadline_secs: DEFAULT_SEAL_DEADLINE_SECS,
            call_timeout_secs: DEFAULT_CALL_TIMEOUT_SECS,
            claim_ttl_secs: DEFAULT_CLAIM_TTL_SECS,
            reconcile_max_in_flight: DEFAULT_RECONCILE_MAX_IN_FLIGHT,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }
}

impl ServiceConfig {
    pub fn seal_deadline(&self) -> Duration {
        Duration::from_secs(self.seal_deadline_secs)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Ledger transaction gateway endpoint and the admin account it authorizes
/// mutations with.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub gateway_url: String,
    #[serde(default)]
    pub contract_address: String,
    #[serde(default)]
    pub authorizer: String,
    /// Network name, informational only: mainnet, testnet, emulator.
    #[serde(default)]
    pub network: String,
}

/// Off-chain record store (REST, service-role credentials).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub service_key: String,
    #[serde(default = "default_store_table")]
    pub table: String,
}

fn default_store_table() -> String {
    "discoveries".to_string()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RpcConfig {
    #[serde(default = "default_rpc_enabled")]
    pub enabled: bool,
    #[serde(default = "default_rpc_addr")]
    pub addr: String,
    /// Bearer token required on mutating endpoints; empty disables auth
    /// (local/emulator only).
    #[serde(default)]
    pub token: String,
}

fn default_rpc_enabled() -> bool {
    true
}

fn default_rpc_addr() -> String {
    DEFAULT_RPC_ADDR.to_string()
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self { enabled: true, addr: DEFAULT_RPC_ADDR.to_string(), token: String::new() }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub rpc: RpcConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        if self.ledger.gateway_url.trim().is_empty() {
            return Err(QuestDropError::ConfigError("ledger.gateway_url is required".to_string()));
        }
        if self.ledger.contract_address.trim().is_empty() {
            return Err(QuestDropError::ConfigError("ledger.contract_address is required".to_string()));
        }
        if self.store.base_url.trim().is_empty() {
            return Err(QuestDropError::ConfigError("store.base_url is required".to_string()));
        }
        if self.service.claim_ttl_secs == 0 {
            return Err(QuestDropError::ConfigError("service.claim_ttl_secs must be positive".to_string()));
        }
        if self.service.seal_deadline_secs == 0 {
            return Err(QuestDropError::ConfigError("service.seal_deadline_secs must be positive".to_string()));
        }
        if self.service.reconcile_max_in_flight == 0 {
            return Err(QuestDropError::ConfigError("service.reconcile_max_in_flight must be positive".to_string()));
        }
        Ok(())
    }
}

/// Load configuration from the default file in `data_dir`
/// (`questdrop-config.toml`). A missing file is fine; defaults plus
/// environment still apply.
pub fn load_config(data_dir: &Path) -> Result<AppConfig> {
    load_config_from_file(&data_dir.join(DEFAULT_CONFIG_FILE), data_dir)
}

pub fn load_config_from_file(path: &Path, data_dir: &Path) -> Result<AppConfig> {
    info!("loading configuration path={} data_dir={}", path.display(), data_dir.display());
    let figment = Figment::from(Serialized::defaults(AppConfig::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));
    let mut config: AppConfig =
        figment.extract().map_err(|e| QuestDropError::ConfigError(format!("config extraction failed: {e}")))?;

    if config.service.data_dir.trim().is_empty() {
        config.service.data_dir = data_dir.display().to_string();
    }
    config.validate()?;
    debug!(
        "configuration loaded gateway={} network={} rpc_addr={} rpc_enabled={}",
        config.ledger.gateway_url, config.ledger.network, config.rpc.addr, config.rpc.enabled
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn valid_toml() -> &'static str {
        r#"
[ledger]
gateway_url = "http://localhost:8888"
contract_address = "0xf8d6e0586b0a20c7"
authorizer = "admin"
network = "emulator"

[store]
base_url = "http://localhost:54321"
service_key = "secret"

[service]
claim_ttl_secs = 30
"#
    }

    #[test]
    fn loads_file_with_defaults_filled_in() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        let mut file = std::fs::File::create(&path).expect("create");
        file.write_all(valid_toml().as_bytes()).expect("write");

        let config = load_config(dir.path()).expect("load");
        assert_eq!(config.ledger.network, "emulator");
        assert_eq!(config.service.claim_ttl_secs, 30);
        assert_eq!(config.service.seal_deadline_secs, DEFAULT_SEAL_DEADLINE_SECS);
        assert_eq!(config.store.table, "discoveries");
        assert_eq!(config.service.data_dir, dir.path().display().to_string());
    }

    #[test]
    fn missing_gateway_is_rejected() {
        let config = AppConfig { store: StoreConfig { base_url: "http://x".into(), ..Default::default() }, ..Default::default() };
        assert!(matches!(config.validate(), Err(QuestDropError::ConfigError(_))));
    }
}
