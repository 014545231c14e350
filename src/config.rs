//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory,
//! then applies `BURST_WORK_DIR`, `BURST_LOG_LEVEL` and `AVALANCHE_NETWORK`
//! overrides. Secrets (`LLM_API_KEY`, `AVALANCHE_PRIVATE_KEY`, `PINATA_JWT`)
//! only ever come from the environment.

use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use alloy::primitives::Address;
use serde::Deserialize;

use crate::error::AppError;
use crate::ledger::Network;

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Which completeness predicate unlocks the confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmationGate {
    /// Required fields present and allocation rules hold.
    Ready,
    /// Every required and optional field present.
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftStoreKind {
    Memory,
    File,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainMode {
    /// In-process ledger; nothing leaves the machine.
    Scripted,
    Rpc,
}

/// Draft store configuration (`[drafts]`).
#[derive(Debug, Clone)]
pub struct DraftsConfig {
    pub store: DraftStoreKind,
    pub ttl: Duration,
}

/// OpenAI / OpenAI-compatible provider configuration.
/// Populated from `[llm.openai]` in the TOML.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Full chat completions endpoint URL.
    pub api_base_url: String,
    /// Model name passed in the request body.
    pub model: String,
    /// Sampling temperature (ignored for models that forbid it).
    pub temperature: f32,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
}

/// LLM configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Which provider is active (`"dummy"`, `"openai"`). `default` in TOML.
    pub provider: String,
    pub openai: OpenAiConfig,
}

/// Chain and factory configuration (`[chain]`).
#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub mode: ChainMode,
    pub network: Network,
    /// Resolved endpoint; the network's public RPC when not configured.
    pub rpc_url: String,
    /// Required in `rpc` mode.
    pub factory_address: Option<Address>,
    pub curve_style: u8,
    pub default_curve_index: u8,
    pub confirmations: u64,
    pub confirmation_timeout: Duration,
}

/// IPFS pinning configuration (`[pinning]`).
#[derive(Debug, Clone)]
pub struct PinningConfig {
    pub enabled: bool,
    pub api_base_url: String,
    pub timeout_seconds: u64,
    /// Metadata URI used whenever pinning is disabled or fails.
    pub fallback_metadata_uri: String,
}

/// Fully-resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Namespaces drafts in the store.
    pub agent_id: String,
    /// Working directory for persistent data (already expanded, no `~`).
    pub work_dir: PathBuf,
    pub log_level: String,
    pub confirmation_gate: ConfirmationGate,
    pub drafts: DraftsConfig,
    pub llm: LlmConfig,
    pub chain: ChainConfig,
    pub pinning: PinningConfig,
    /// From `LLM_API_KEY`; `None` for keyless local models.
    pub llm_api_key: Option<String>,
    /// From `AVALANCHE_PRIVATE_KEY`.
    pub avalanche_private_key: Option<String>,
    /// From `PINATA_JWT`.
    pub pinata_jwt: Option<String>,
}

/// Values taken from the environment. Tests build this directly instead of
/// mutating process env.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub work_dir: Option<String>,
    pub log_level: Option<String>,
    pub network: Option<String>,
    pub llm_api_key: Option<String>,
    pub avalanche_private_key: Option<String>,
    pub pinata_jwt: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        let var = |k: &str| env::var(k).ok().filter(|v| !v.trim().is_empty());
        Self {
            work_dir: var("BURST_WORK_DIR"),
            log_level: var("BURST_LOG_LEVEL"),
            network: var("AVALANCHE_NETWORK"),
            llm_api_key: var("LLM_API_KEY"),
            avalanche_private_key: var("AVALANCHE_PRIVATE_KEY"),
            pinata_jwt: var("PINATA_JWT"),
        }
    }
}

// ── Raw TOML shape ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RawConfig {
    agent: RawAgent,
    #[serde(default)]
    drafts: RawDrafts,
    #[serde(default)]
    llm: RawLlm,
    #[serde(default)]
    chain: RawChain,
    #[serde(default)]
    pinning: RawPinning,
}

#[derive(Deserialize)]
struct RawAgent {
    #[serde(default = "default_agent_id")]
    agent_id: String,
    work_dir: String,
    log_level: String,
    #[serde(default = "default_gate")]
    confirmation_gate: ConfirmationGate,
}

#[derive(Deserialize)]
struct RawDrafts {
    #[serde(default = "default_store")]
    store: DraftStoreKind,
    #[serde(default = "default_ttl_days")]
    ttl_days: u64,
}

impl Default for RawDrafts {
    fn default() -> Self {
        Self { store: default_store(), ttl_days: default_ttl_days() }
    }
}

#[derive(Deserialize)]
struct RawLlm {
    #[serde(rename = "default", default = "default_llm_provider")]
    provider: String,
    #[serde(default)]
    openai: RawOpenAiConfig,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self { provider: default_llm_provider(), openai: RawOpenAiConfig::default() }
    }
}

#[derive(Deserialize)]
struct RawOpenAiConfig {
    #[serde(default = "default_openai_api_base_url")]
    api_base_url: String,
    #[serde(default = "default_openai_model")]
    model: String,
    #[serde(default = "default_openai_temperature")]
    temperature: f32,
    #[serde(default = "default_openai_timeout_seconds")]
    timeout_seconds: u64,
}

impl Default for RawOpenAiConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_openai_api_base_url(),
            model: default_openai_model(),
            temperature: default_openai_temperature(),
            timeout_seconds: default_openai_timeout_seconds(),
        }
    }
}

#[derive(Deserialize)]
struct RawChain {
    #[serde(default = "default_chain_mode")]
    mode: ChainMode,
    #[serde(default = "default_network")]
    network: String,
    #[serde(default)]
    rpc_url: Option<String>,
    #[serde(default)]
    factory_address: Option<String>,
    #[serde(default = "default_curve_style")]
    curve_style: u8,
    #[serde(default = "default_curve_index")]
    default_curve_index: u8,
    #[serde(default = "default_confirmations")]
    confirmations: u64,
    #[serde(default = "default_confirmation_timeout_seconds")]
    confirmation_timeout_seconds: u64,
}

impl Default for RawChain {
    fn default() -> Self {
        Self {
            mode: default_chain_mode(),
            network: default_network(),
            rpc_url: None,
            factory_address: None,
            curve_style: default_curve_style(),
            default_curve_index: default_curve_index(),
            confirmations: default_confirmations(),
            confirmation_timeout_seconds: default_confirmation_timeout_seconds(),
        }
    }
}

#[derive(Deserialize)]
struct RawPinning {
    #[serde(default)]
    enabled: bool,
    #[serde(default = "default_pinata_api_base_url")]
    api_base_url: String,
    #[serde(default = "default_pinning_timeout_seconds")]
    timeout_seconds: u64,
    #[serde(default = "default_fallback_metadata_uri")]
    fallback_metadata_uri: String,
}

impl Default for RawPinning {
    fn default() -> Self {
        Self {
            enabled: false,
            api_base_url: default_pinata_api_base_url(),
            timeout_seconds: default_pinning_timeout_seconds(),
            fallback_metadata_uri: default_fallback_metadata_uri(),
        }
    }
}

fn default_agent_id() -> String { "burst".to_string() }
fn default_gate() -> ConfirmationGate { ConfirmationGate::Ready }
fn default_store() -> DraftStoreKind { DraftStoreKind::File }
fn default_ttl_days() -> u64 { 7 }
fn default_llm_provider() -> String { "dummy".to_string() }
fn default_openai_api_base_url() -> String { "https://api.openai.com/v1/chat/completions".to_string() }
fn default_openai_model() -> String { "gpt-4o-mini".to_string() }
fn default_openai_temperature() -> f32 { 0.0 }
fn default_openai_timeout_seconds() -> u64 { 60 }
fn default_chain_mode() -> ChainMode { ChainMode::Scripted }
fn default_network() -> String { "testnet".to_string() }
fn default_curve_style() -> u8 { 2 }
fn default_curve_index() -> u8 { 37 }
fn default_confirmations() -> u64 { 4 }
fn default_confirmation_timeout_seconds() -> u64 { 300 }
fn default_pinata_api_base_url() -> String { "https://api.pinata.cloud".to_string() }
fn default_pinning_timeout_seconds() -> u64 { 30 }
fn default_fallback_metadata_uri() -> String {
    "ipfs://bafkreic5j5qiaubsc3xclslyc7envnmevsw35pw2uxeulhjfoidfdtpzka".to_string()
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Load config from `config/default.toml`, then apply env-var overrides.
pub fn load() -> Result<Config, AppError> {
    load_from(Path::new("config/default.toml"), &EnvOverrides::from_env())
}

/// Loader with an explicit path and overrides.
pub fn load_from(path: &Path, overrides: &EnvOverrides) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let parsed: RawConfig = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    let a = parsed.agent;
    if a.agent_id.trim().is_empty() {
        return Err(AppError::Config("agent.agent_id must not be empty".into()));
    }
    let work_dir = expand_home(overrides.work_dir.as_deref().unwrap_or(&a.work_dir));
    let log_level = overrides.log_level.clone().unwrap_or(a.log_level);
    crate::logger::filter_directives(&log_level)
        .map_err(|e| AppError::Config(format!("agent.log_level: {e}")))?;

    if parsed.drafts.ttl_days == 0 {
        return Err(AppError::Config("drafts.ttl_days must be at least 1".into()));
    }

    let chain = resolve_chain(parsed.chain, overrides.network.as_deref())?;

    Ok(Config {
        agent_id: a.agent_id,
        work_dir,
        log_level,
        confirmation_gate: a.confirmation_gate,
        drafts: DraftsConfig {
            store: parsed.drafts.store,
            ttl: Duration::from_secs(parsed.drafts.ttl_days * SECS_PER_DAY),
        },
        llm: LlmConfig {
            provider: parsed.llm.provider,
            openai: OpenAiConfig {
                api_base_url: parsed.llm.openai.api_base_url,
                model: parsed.llm.openai.model,
                temperature: parsed.llm.openai.temperature,
                timeout_seconds: parsed.llm.openai.timeout_seconds,
            },
        },
        chain,
        pinning: PinningConfig {
            enabled: parsed.pinning.enabled,
            api_base_url: parsed.pinning.api_base_url,
            timeout_seconds: parsed.pinning.timeout_seconds,
            fallback_metadata_uri: parsed.pinning.fallback_metadata_uri,
        },
        llm_api_key: overrides.llm_api_key.clone(),
        avalanche_private_key: overrides.avalanche_private_key.clone(),
        pinata_jwt: overrides.pinata_jwt.clone(),
    })
}

fn resolve_chain(c: RawChain, network_override: Option<&str>) -> Result<ChainConfig, AppError> {
    let network: Network = network_override
        .unwrap_or(&c.network)
        .parse()
        .map_err(|e| AppError::Config(format!("chain.network: {e}")))?;

    let factory_address = c
        .factory_address
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<Address>()
                .map_err(|e| AppError::Config(format!("chain.factory_address '{s}': {e}")))
        })
        .transpose()?;

    if c.mode == ChainMode::Rpc && factory_address.is_none() {
        return Err(AppError::Config("chain.factory_address is required when chain.mode = \"rpc\"".into()));
    }
    if c.confirmation_timeout_seconds == 0 {
        return Err(AppError::Config("chain.confirmation_timeout_seconds must be positive".into()));
    }

    Ok(ChainConfig {
        mode: c.mode,
        network,
        rpc_url: c
            .rpc_url
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| network.default_rpc_url().to_string()),
        factory_address,
        curve_style: c.curve_style,
        default_curve_index: c.default_curve_index,
        confirmations: c.confirmations,
        confirmation_timeout: Duration::from_secs(c.confirmation_timeout_seconds),
    })
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

// ── test helpers ──────────────────────────────────────────────────────────────

/// Safe `Config` for tests: dummy LLM, scripted chain, no pinning, no keys.
impl Config {
    pub fn test_default(work_dir: &Path) -> Self {
        Self {
            agent_id: "test".into(),
            work_dir: work_dir.to_path_buf(),
            log_level: "info".into(),
            confirmation_gate: ConfirmationGate::Ready,
            drafts: DraftsConfig {
                store: DraftStoreKind::Memory,
                ttl: Duration::from_secs(default_ttl_days() * SECS_PER_DAY),
            },
            llm: LlmConfig {
                provider: "dummy".into(),
                openai: OpenAiConfig {
                    api_base_url: "http://localhost:0/v1/chat/completions".into(),
                    model: "test-model".into(),
                    temperature: 0.0,
                    timeout_seconds: 1,
                },
            },
            chain: ChainConfig {
                mode: ChainMode::Scripted,
                network: Network::Testnet,
                rpc_url: Network::Testnet.default_rpc_url().into(),
                factory_address: None,
                curve_style: default_curve_style(),
                default_curve_index: default_curve_index(),
                confirmations: default_confirmations(),
                confirmation_timeout: Duration::from_secs(5),
            },
            pinning: PinningConfig {
                enabled: false,
                api_base_url: "http://localhost:0".into(),
                timeout_seconds: 1,
                fallback_metadata_uri: default_fallback_metadata_uri(),
            },
            llm_api_key: None,
            avalanche_private_key: None,
            pinata_jwt: None,
        }
    }
}
