//! Ledger client for the burst factory contract.
//!
//! `LedgerClient` is an enum over backends in the same way `LlmProvider` is:
//! `Rpc` talks to a real chain through alloy, `Scripted` answers in-process
//! for dry runs and tests. Callers only see the narrow launch surface:
//! read curves, simulate, submit, wait for confirmations.

pub mod abi;
pub mod rpc;
pub mod scripted;

use std::fmt;
use std::str::FromStr;

use alloy::primitives::{Address, Log, TxHash, B256, U256};
use alloy::sol_types::SolEvent;
use thiserror::Error;

use crate::config::{ChainConfig, ChainMode};
use abi::BurstFactory;

/// 10^18: one whole AVAX or one whole token in base units.
pub const WEI_PER_UNIT: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger config: {0}")]
    Config(String),
    #[error("contract read failed: {0}")]
    Read(String),
    #[error("simulation failed: {0}")]
    Simulate(String),
    #[error("submit failed: {0}")]
    Submit(String),
    #[error("confirmation failed for {tx}: {cause}")]
    Confirm { tx: TxHash, cause: String },
}

// ── Network ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    /// Avalanche Fuji.
    Testnet,
    /// Avalanche C-Chain.
    Mainnet,
}

impl Network {
    pub fn chain_id(self) -> u64 {
        match self {
            Network::Testnet => 43113,
            Network::Mainnet => 43114,
        }
    }

    pub fn default_rpc_url(self) -> &'static str {
        match self {
            Network::Testnet => "https://api.avax-test.network/ext/bc/C/rpc",
            Network::Mainnet => "https://api.avax.network/ext/bc/C/rpc",
        }
    }

    fn explorer_base(self) -> &'static str {
        match self {
            Network::Testnet => "https://testnet.snowtrace.io",
            Network::Mainnet => "https://snowtrace.io",
        }
    }

    pub fn address_url(self, address: Address) -> String {
        format!("{}/address/{address}", self.explorer_base())
    }

    pub fn tx_url(self, tx: TxHash) -> String {
        format!("{}/tx/{tx}", self.explorer_base())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Network::Testnet => "testnet",
            Network::Mainnet => "mainnet",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "testnet" | "fuji" => Ok(Network::Testnet),
            "mainnet" | "avalanche" => Ok(Network::Mainnet),
            other => Err(LedgerError::Config(format!(
                "unknown network '{other}' (expected testnet or mainnet)"
            ))),
        }
    }
}

/// Public burst page for a launched token.
pub fn burst_page_url(token: Address) -> String {
    format!("https://apexdefi.xyz/burst/{token}")
}

// ── Call / result types ───────────────────────────────────────────────────────

/// One bonding curve offered by the factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Curve {
    pub index: u8,
    pub style: u8,
    /// Wei of AVAX raised before the burst.
    pub avax_at_launch: U256,
    pub base_price: U256,
    pub percent_of_lp: U256,
}

impl From<abi::BurstFactory::CurveWithIndex> for Curve {
    fn from(c: abi::BurstFactory::CurveWithIndex) -> Self {
        Self {
            index: c.index,
            style: c.curveData.curveStyle,
            avax_at_launch: c.curveData.avaxAtLaunch,
            base_price: c.curveData.basePrice,
            percent_of_lp: c.curveData.percentOfLP,
        }
    }
}

/// Fully resolved arguments of `burstTokenWithCreator`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCall {
    pub name: String,
    pub symbol: String,
    /// Base units (18 decimals).
    pub total_supply: U256,
    pub trading_fee: U256,
    pub max_wallet_percent: U256,
    pub metadata_uri: String,
    pub curve_index: u8,
    pub salt: B256,
    pub allocations: Vec<BurstFactory::DexAllocation>,
    pub creator: Address,
}

impl LaunchCall {
    pub fn to_call(&self) -> BurstFactory::burstTokenWithCreatorCall {
        BurstFactory::burstTokenWithCreatorCall {
            tokenName: self.name.clone(),
            tokenSymbol: self.symbol.clone(),
            totalSupply_: self.total_supply,
            tradingFee: self.trading_fee,
            maxWalletPercent_: self.max_wallet_percent,
            metadataURI: self.metadata_uri.clone(),
            curveIndex_: self.curve_index,
            salt: self.salt,
            dexAllocations: self.allocations.clone(),
            creator: self.creator,
        }
    }
}

/// Mined transaction and the logs it emitted.
#[derive(Debug, Clone)]
pub struct LaunchReceipt {
    pub tx_hash: TxHash,
    pub success: bool,
    pub logs: Vec<Log>,
}

/// Address of the first `TokenCreated` event in `logs`, if any.
pub fn token_created(logs: &[Log]) -> Option<Address> {
    logs.iter()
        .filter(|log| log.topics().first() == Some(&BurstFactory::TokenCreated::SIGNATURE_HASH))
        .find_map(|log| BurstFactory::TokenCreated::decode_log(log).ok())
        .map(|event| event.data.token)
}

// ── Client ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum LedgerClient {
    Rpc(rpc::RpcLedger),
    Scripted(scripted::ScriptedLedger),
}

impl LedgerClient {
    /// Address of the submitting account.
    pub fn signer(&self) -> Address {
        match self {
            LedgerClient::Rpc(l) => l.signer(),
            LedgerClient::Scripted(l) => l.signer(),
        }
    }

    pub async fn curves(&self) -> Result<Vec<Curve>, LedgerError> {
        match self {
            LedgerClient::Rpc(l) => l.curves().await,
            LedgerClient::Scripted(l) => l.curves(),
        }
    }

    /// Dry-run the launch; returns the address the call would create.
    pub async fn simulate(&self, call: &LaunchCall) -> Result<Address, LedgerError> {
        match self {
            LedgerClient::Rpc(l) => l.simulate(call).await,
            LedgerClient::Scripted(l) => l.simulate(call),
        }
    }

    pub async fn submit(&self, call: &LaunchCall) -> Result<TxHash, LedgerError> {
        match self {
            LedgerClient::Rpc(l) => l.submit(call).await,
            LedgerClient::Scripted(l) => l.submit(call),
        }
    }

    /// Block until `tx` has `confirmations` confirmations.
    pub async fn wait_for(
        &self,
        tx: TxHash,
        confirmations: u64,
    ) -> Result<LaunchReceipt, LedgerError> {
        match self {
            LedgerClient::Rpc(l) => l.wait_for(tx, confirmations).await,
            LedgerClient::Scripted(l) => l.wait_for(tx).await,
        }
    }
}

/// Construct the configured ledger client.
///
/// `private_key` comes from `AVALANCHE_PRIVATE_KEY` and is only needed for
/// `rpc` mode.
pub fn build(config: &ChainConfig, private_key: Option<&str>) -> Result<LedgerClient, LedgerError> {
    match config.mode {
        ChainMode::Scripted => Ok(LedgerClient::Scripted(scripted::ScriptedLedger::demo())),
        ChainMode::Rpc => {
            let key = private_key.ok_or_else(|| {
                LedgerError::Config("AVALANCHE_PRIVATE_KEY is required in rpc mode".into())
            })?;
            let factory = config.factory_address.ok_or_else(|| {
                LedgerError::Config("chain.factory_address is required in rpc mode".into())
            })?;
            let ledger = rpc::RpcLedger::connect(&config.rpc_url, key, factory)?;
            Ok(LedgerClient::Rpc(ledger))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, Bytes, LogData};

    #[test]
    fn network_parsing_and_links() {
        assert_eq!("testnet".parse::<Network>().unwrap(), Network::Testnet);
        assert_eq!("Mainnet".parse::<Network>().unwrap(), Network::Mainnet);
        assert!("devnet".parse::<Network>().is_err());
        assert_eq!(Network::Testnet.chain_id(), 43113);

        let token = address!("0x1111111111111111111111111111111111111111");
        assert!(Network::Mainnet.address_url(token).starts_with("https://snowtrace.io/address/0x"));
        assert!(burst_page_url(token).starts_with("https://apexdefi.xyz/burst/0x"));
    }

    #[test]
    fn token_created_finds_event_among_other_logs() {
        let factory = address!("0x2222222222222222222222222222222222222222");
        let token = address!("0x3333333333333333333333333333333333333333");
        let creator = address!("0x4444444444444444444444444444444444444444");

        let unrelated = Log { address: factory, data: LogData::new_unchecked(vec![B256::ZERO], Bytes::new()) };
        let event = BurstFactory::TokenCreated {
            token,
            creator,
            whitelistEnabled: false,
            curveIndex: U256::from(37),
        };
        let created = Log { address: factory, data: event.encode_log_data() };

        assert_eq!(token_created(&[unrelated.clone(), created]), Some(token));
        assert_eq!(token_created(&[unrelated]), None);
        assert_eq!(token_created(&[]), None);
    }

    #[test]
    fn launch_call_maps_to_abi_call() {
        let call = LaunchCall {
            name: "Test".into(),
            symbol: "TST".into(),
            total_supply: U256::from(1u64),
            trading_fee: U256::ZERO,
            max_wallet_percent: U256::ZERO,
            metadata_uri: "ipfs://x".into(),
            curve_index: 37,
            salt: B256::ZERO,
            allocations: vec![BurstFactory::DexAllocation { dex: 0, isReward: true, allocation: U256::from(10_000) }],
            creator: Address::ZERO,
        };
        let abi = call.to_call();
        assert_eq!(abi.curveIndex_, 37);
        assert_eq!(abi.tokenSymbol, "TST");
        assert!(abi.dexAllocations[0].isReward);
    }
}
