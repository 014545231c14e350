//! JSON-RPC backend: a signing alloy provider bound to one factory address.

use std::fmt;

use alloy::network::EthereumWallet;
use alloy::primitives::{Address, TxHash};
use alloy::providers::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::http::reqwest::Url;
use tracing::{debug, info};

use super::abi::BurstFactory::{self, BurstFactoryInstance};
use super::{Curve, LaunchCall, LaunchReceipt, LedgerError};

#[derive(Clone)]
pub struct RpcLedger {
    provider: DynProvider,
    factory: BurstFactoryInstance<DynProvider>,
    signer: Address,
}

impl fmt::Debug for RpcLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcLedger")
            .field("factory", self.factory.address())
            .field("signer", &self.signer)
            .finish_non_exhaustive()
    }
}

impl RpcLedger {
    /// Build the provider. No network traffic happens until the first call.
    pub fn connect(rpc_url: &str, private_key: &str, factory: Address) -> Result<Self, LedgerError> {
        let signer: PrivateKeySigner = private_key
            .trim()
            .parse()
            .map_err(|e| LedgerError::Config(format!("invalid private key: {e}")))?;
        let signer_address = signer.address();
        let url: Url = rpc_url
            .parse()
            .map_err(|e| LedgerError::Config(format!("invalid rpc url '{rpc_url}': {e}")))?;

        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(url)
            .erased();
        let factory_instance = BurstFactory::new(factory, provider.clone());

        info!(%factory, signer = %signer_address, %rpc_url, "rpc ledger ready");
        Ok(Self { provider, factory: factory_instance, signer: signer_address })
    }

    pub fn signer(&self) -> Address {
        self.signer
    }

    pub async fn curves(&self) -> Result<Vec<Curve>, LedgerError> {
        let curves = self
            .factory
            .getAllCurves()
            .call()
            .await
            .map_err(|e| LedgerError::Read(e.to_string()))?;
        debug!(count = curves.len(), "read factory curves");
        Ok(curves.into_iter().map(Curve::from).collect())
    }

    pub async fn simulate(&self, call: &LaunchCall) -> Result<Address, LedgerError> {
        self.factory
            .call_builder(&call.to_call())
            .from(self.signer)
            .call()
            .await
            .map_err(|e| LedgerError::Simulate(e.to_string()))
    }

    pub async fn submit(&self, call: &LaunchCall) -> Result<TxHash, LedgerError> {
        let pending = self
            .factory
            .call_builder(&call.to_call())
            .from(self.signer)
            .send()
            .await
            .map_err(|e| LedgerError::Submit(e.to_string()))?;
        Ok(*pending.tx_hash())
    }

    pub async fn wait_for(&self, tx: TxHash, confirmations: u64) -> Result<LaunchReceipt, LedgerError> {
        let receipt = PendingTransactionBuilder::new(self.provider.root().clone(), tx)
            .with_required_confirmations(confirmations)
            .get_receipt()
            .await
            .map_err(|e| LedgerError::Confirm { tx, cause: e.to_string() })?;

        Ok(LaunchReceipt {
            tx_hash: tx,
            success: receipt.status(),
            logs: receipt.inner.logs().iter().map(|l| l.inner.clone()).collect(),
        })
    }
}
