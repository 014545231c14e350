//! Tests for the shipped config/default.toml

use std::path::Path;

use burst_agent::config::{self, ChainMode, ConfirmationGate, DraftStoreKind, EnvOverrides};
use burst_agent::ledger::Network;

fn shipped() -> config::Config {
    config::load_from(Path::new("config/default.toml"), &EnvOverrides::default())
        .expect("config/default.toml must load")
}

#[test]
fn test_default_config_loads() {
    let cfg = shipped();
    assert_eq!(cfg.agent_id, "burst");
    assert_eq!(cfg.log_level, "info");
    assert!(!cfg.work_dir.to_string_lossy().contains('~'));
}

#[test]
fn test_default_config_is_safe_offline() {
    let cfg = shipped();
    assert_eq!(cfg.llm.provider, "dummy");
    assert_eq!(cfg.chain.mode, ChainMode::Scripted);
    assert_eq!(cfg.chain.network, Network::Testnet);
    assert!(!cfg.pinning.enabled);
    assert!(cfg.llm_api_key.is_none());
    assert!(cfg.avalanche_private_key.is_none());
}

#[test]
fn test_default_launch_parameters() {
    let cfg = shipped();
    assert_eq!(cfg.confirmation_gate, ConfirmationGate::Ready);
    assert_eq!(cfg.drafts.store, DraftStoreKind::File);
    assert_eq!(cfg.drafts.ttl.as_secs(), 7 * 24 * 60 * 60);
    assert_eq!(cfg.chain.curve_style, 2);
    assert_eq!(cfg.chain.default_curve_index, 37);
    assert_eq!(cfg.chain.confirmations, 4);
    assert_eq!(cfg.chain.rpc_url, "https://api.avax-test.network/ext/bc/C/rpc");
    assert_eq!(
        cfg.pinning.fallback_metadata_uri,
        "ipfs://bafkreic5j5qiaubsc3xclslyc7envnmevsw35pw2uxeulhjfoidfdtpzka"
    );
}

#[test]
fn test_network_override_switches_rpc() {
    let overrides = EnvOverrides { network: Some("mainnet".into()), ..Default::default() };
    let cfg = config::load_from(Path::new("config/default.toml"), &overrides).unwrap();
    assert_eq!(cfg.chain.network, Network::Mainnet);
    assert_eq!(cfg.chain.network.chain_id(), 43114);
    assert_eq!(cfg.chain.rpc_url, "https://api.avax.network/ext/bc/C/rpc");
}

#[test]
fn test_collaborators_build_from_defaults() {
    let cfg = shipped();
    assert!(burst_agent::llm::providers::build(&cfg.llm, None).is_ok());
    assert!(burst_agent::ledger::build(&cfg.chain, None).is_ok());
    assert!(burst_agent::pinning::build(&cfg.pinning, None).is_ok());
}
