//! In-process ledger that answers from a script.
//!
//! Used by `chain.mode = "scripted"` for dry runs and by tests. Clones share
//! state, so a test can hand one clone to the builder and inspect the other.

use std::sync::{Arc, Mutex};

use alloy::primitives::{address, Address, Log, TxHash, B256, U256};
use alloy::sol_types::SolEvent;
use tracing::info;

use super::abi::BurstFactory;
use super::{Curve, LaunchCall, LaunchReceipt, LedgerError, WEI_PER_UNIT};

/// What the script does at each step.
#[derive(Debug, Clone)]
pub struct Script {
    pub signer: Address,
    pub factory: Address,
    pub curves: Vec<Curve>,
    /// Address returned by simulation and announced in `TokenCreated`.
    pub token: Address,
    pub fail_curves: bool,
    pub reject_simulation: bool,
    pub fail_submit: bool,
    pub revert: bool,
    pub emit_event: bool,
    /// Never confirm; lets callers exercise their timeout.
    pub stall: bool,
}

#[derive(Debug, Default)]
struct Journal {
    submitted: Vec<LaunchCall>,
    simulated: usize,
}

#[derive(Debug, Clone)]
pub struct ScriptedLedger {
    script: Arc<Mutex<Script>>,
    journal: Arc<Mutex<Journal>>,
}

/// A curve with `avax` whole AVAX at launch.
pub fn curve(index: u8, style: u8, avax: u64) -> Curve {
    Curve {
        index,
        style,
        avax_at_launch: U256::from(avax) * WEI_PER_UNIT,
        base_price: U256::from(1_000_000_000u64),
        percent_of_lp: U256::from(8_000u64),
    }
}

impl Script {
    /// A factory offering a small style-2 ladder plus one style-1 decoy.
    pub fn demo() -> Self {
        Self {
            signer: address!("0x5A11CE0000000000000000000000000000000001"),
            factory: address!("0xFAC7000000000000000000000000000000000001"),
            curves: vec![
                curve(12, 1, 250),
                curve(35, 2, 50),
                curve(36, 2, 100),
                curve(37, 2, 250),
                curve(38, 2, 300),
                curve(39, 2, 500),
                curve(40, 2, 1000),
                curve(41, 2, 2000),
            ],
            token: address!("0xB0B5000000000000000000000000000000000001"),
            fail_curves: false,
            reject_simulation: false,
            fail_submit: false,
            revert: false,
            emit_event: true,
            stall: false,
        }
    }
}

impl ScriptedLedger {
    pub fn new(script: Script) -> Self {
        Self {
            script: Arc::new(Mutex::new(script)),
            journal: Arc::new(Mutex::new(Journal::default())),
        }
    }

    pub fn demo() -> Self {
        Self::new(Script::demo())
    }

    /// Change the script in place; all clones observe the change.
    pub fn update(&self, f: impl FnOnce(&mut Script)) {
        if let Ok(mut script) = self.script.lock() {
            f(&mut script);
        }
    }

    fn script(&self) -> Result<Script, LedgerError> {
        self.script
            .lock()
            .map(|s| s.clone())
            .map_err(|_| LedgerError::Config("scripted ledger lock poisoned".into()))
    }

    /// Calls that reached `submit`, in order.
    pub fn submitted(&self) -> Vec<LaunchCall> {
        self.journal.lock().map(|j| j.submitted.clone()).unwrap_or_default()
    }

    pub fn simulated(&self) -> usize {
        self.journal.lock().map(|j| j.simulated).unwrap_or_default()
    }

    pub fn signer(&self) -> Address {
        self.script().map(|s| s.signer).unwrap_or_default()
    }

    pub fn curves(&self) -> Result<Vec<Curve>, LedgerError> {
        let script = self.script()?;
        if script.fail_curves {
            return Err(LedgerError::Read("scripted curve read failure".into()));
        }
        Ok(script.curves)
    }

    pub fn simulate(&self, _call: &LaunchCall) -> Result<Address, LedgerError> {
        let script = self.script()?;
        if let Ok(mut j) = self.journal.lock() {
            j.simulated += 1;
        }
        if script.reject_simulation {
            return Err(LedgerError::Simulate("execution reverted".into()));
        }
        Ok(script.token)
    }

    pub fn submit(&self, call: &LaunchCall) -> Result<TxHash, LedgerError> {
        let script = self.script()?;
        if script.fail_submit {
            return Err(LedgerError::Submit("scripted submit failure".into()));
        }
        let mut journal = self
            .journal
            .lock()
            .map_err(|_| LedgerError::Submit("scripted ledger lock poisoned".into()))?;
        journal.submitted.push(call.clone());
        let tx = B256::from(U256::from(journal.submitted.len()));
        info!(%tx, name = %call.name, "scripted launch submitted");
        Ok(tx)
    }

    pub async fn wait_for(&self, tx: TxHash) -> Result<LaunchReceipt, LedgerError> {
        let script = self.script()?;
        if script.stall {
            std::future::pending::<()>().await;
        }
        let mut logs = Vec::new();
        if script.emit_event && !script.revert {
            let creator = self
                .submitted()
                .last()
                .map(|c| c.creator)
                .unwrap_or(script.signer);
            let curve_index = self.submitted().last().map(|c| c.curve_index).unwrap_or_default();
            let event = BurstFactory::TokenCreated {
                token: script.token,
                creator,
                whitelistEnabled: false,
                curveIndex: U256::from(curve_index),
            };
            logs.push(Log { address: script.factory, data: event.encode_log_data() });
        }
        Ok(LaunchReceipt { tx_hash: tx, success: !script.revert, logs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::token_created;

    fn call() -> LaunchCall {
        LaunchCall {
            name: "Test".into(),
            symbol: "TST".into(),
            total_supply: U256::from(1u64) * WEI_PER_UNIT,
            trading_fee: U256::ZERO,
            max_wallet_percent: U256::ZERO,
            metadata_uri: "ipfs://meta".into(),
            curve_index: 38,
            salt: B256::ZERO,
            allocations: vec![],
            creator: Address::repeat_byte(0x42),
        }
    }

    #[tokio::test]
    async fn happy_script_emits_token_created() {
        let ledger = ScriptedLedger::demo();
        let addr = ledger.simulate(&call()).unwrap();
        let tx = ledger.submit(&call()).unwrap();
        let receipt = ledger.wait_for(tx).await.unwrap();
        assert!(receipt.success);
        assert_eq!(token_created(&receipt.logs), Some(addr));
        assert_eq!(ledger.submitted().len(), 1);
        assert_eq!(ledger.simulated(), 1);
    }

    #[tokio::test]
    async fn clones_share_script_and_journal() {
        let ledger = ScriptedLedger::demo();
        let other = ledger.clone();
        other.update(|s| s.reject_simulation = true);
        assert!(ledger.simulate(&call()).is_err());
        other.update(|s| s.reject_simulation = false);
        ledger.submit(&call()).unwrap();
        assert_eq!(other.submitted().len(), 1);
    }

    #[test]
    fn demo_curves_are_in_wei() {
        let curves = ScriptedLedger::demo().curves().unwrap();
        let c = curves.iter().find(|c| c.index == 37).unwrap();
        assert_eq!(c.avax_at_launch, U256::from(250u64) * WEI_PER_UNIT);
        assert_eq!(c.style, 2);
    }
}
