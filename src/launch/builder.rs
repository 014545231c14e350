//! Transaction builder: validates a confirmed draft and drives one
//! `burstTokenWithCreator` call through the ledger.
//!
//! Steps, in order: validate, pin metadata, read curves, pick a curve,
//! simulate, submit, wait for confirmations, read `TokenCreated`.

use std::time::Duration;

use alloy::primitives::{Address, B256, TxHash, U256};
use tracing::{debug, info, warn};

use super::dex::{allocation_total, allocations_include, BurstDex, DexAllocation, FULL_ALLOCATION_BPS};
use super::draft::DraftRecord;
use super::fields::{validate_field, FieldName};
use super::metadata::{pin_or_fallback, TokenMetadata};
use super::LaunchError;
use crate::config::{ChainConfig, PinningConfig};
use crate::ledger::abi::BurstFactory;
use crate::ledger::{token_created, Curve, LaunchCall, LedgerClient, WEI_PER_UNIT};
use crate::pinning::PinningService;

/// Burst amounts are matched against curve thresholds in steps of this many AVAX.
pub const CURVE_STEP_AVAX: f64 = 5.0;

/// Outcome of a mined launch. `token` is the zero address when the receipt
/// carried no `TokenCreated` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchResult {
    pub tx: TxHash,
    pub token: Address,
}

impl LaunchResult {
    pub fn token_known(&self) -> bool {
        self.token != Address::ZERO
    }
}

/// A draft that passed every pre-submission rule.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedLaunch {
    pub name: String,
    pub symbol: String,
    pub total_supply: U256,
    pub burst_amount: f64,
    pub trading_fee: u32,
    pub max_wallet_percent: u32,
    pub allocations: Vec<DexAllocation>,
    pub reward_dex: BurstDex,
    pub creator: Address,
}

fn required<T: Clone>(value: &Option<T>, field: FieldName) -> Result<T, LaunchError> {
    value.clone().ok_or_else(|| LaunchError::invalid(field, "required"))
}

fn checked<T: Clone>(draft: &DraftRecord, value: &Option<T>, field: FieldName) -> Result<T, LaunchError> {
    let v = required(value, field)?;
    validate_field(field, draft).map_err(|reason| LaunchError::invalid(field, reason))?;
    Ok(v)
}

/// Final domain validation: the catalog's per-field rules, then the
/// allocation rules. A zero creator address is replaced by `signer`.
pub fn validate(draft: &DraftRecord, signer: Address) -> Result<ValidatedLaunch, LaunchError> {
    let name = checked(draft, &draft.name, FieldName::Name)?;
    let symbol = checked(draft, &draft.symbol, FieldName::Symbol)?;

    let creator_text = checked(draft, &draft.creator_address, FieldName::CreatorAddress)?;
    let creator = creator_text
        .trim()
        .parse::<Address>()
        .map_err(|e| LaunchError::invalid(FieldName::CreatorAddress, e.to_string()))?;
    let creator = if creator == Address::ZERO { signer } else { creator };

    let supply = checked(draft, &draft.total_supply, FieldName::TotalSupply)?;
    let total_supply = U256::from(supply) * WEI_PER_UNIT;

    let burst_amount = checked(draft, &draft.burst_amount, FieldName::BurstAmount)?;

    for field in [FieldName::TradingFee, FieldName::MaxWalletPercent] {
        validate_field(field, draft).map_err(|reason| LaunchError::invalid(field, reason))?;
    }
    let trading_fee = draft.trading_fee.unwrap_or(0);
    let max_wallet_percent = draft.max_wallet_percent.unwrap_or(0);

    let allocations = checked(draft, &draft.dex_allocations, FieldName::DexAllocations)?;
    let total = allocation_total(&allocations);
    if total != u64::from(FULL_ALLOCATION_BPS) {
        return Err(LaunchError::invalid(
            FieldName::DexAllocations,
            format!("allocations must sum to {FULL_ALLOCATION_BPS}, got {total}"),
        ));
    }

    let reward_dex = required(&draft.reward_dex, FieldName::RewardDex)?;
    if !allocations_include(&allocations, reward_dex) {
        return Err(LaunchError::invalid(
            FieldName::RewardDex,
            format!("{reward_dex} is not one of the allocation DEXs"),
        ));
    }

    Ok(ValidatedLaunch {
        name,
        symbol,
        total_supply,
        burst_amount,
        trading_fee,
        max_wallet_percent,
        allocations,
        reward_dex,
        creator,
    })
}

fn round_to_step(avax: f64) -> i64 {
    ((avax / CURVE_STEP_AVAX).round() * CURVE_STEP_AVAX) as i64
}

/// Whole AVAX of a curve threshold, `None` when it does not fit an `f64`.
fn threshold_avax(curve: &Curve) -> Option<f64> {
    u128::try_from(curve.avax_at_launch)
        .ok()
        .map(|wei| wei as f64 / 1e18)
}

/// Curve whose threshold, rounded to the nearest 5 AVAX, equals the burst
/// amount rounded the same way, restricted to `style`. Falls back to
/// `default_index`.
pub fn select_curve_index(burst_amount: f64, curves: &[Curve], style: u8, default_index: u8) -> u8 {
    let wanted = round_to_step(burst_amount);
    curves
        .iter()
        .filter(|c| c.style == style)
        .find(|c| threshold_avax(c).is_some_and(|avax| round_to_step(avax) == wanted))
        .map(|c| c.index)
        .unwrap_or(default_index)
}

/// Map a validated launch onto the contract call.
pub fn launch_call(launch: &ValidatedLaunch, metadata_uri: String, curve_index: u8) -> LaunchCall {
    LaunchCall {
        name: launch.name.clone(),
        symbol: launch.symbol.clone(),
        total_supply: launch.total_supply,
        trading_fee: U256::from(launch.trading_fee),
        max_wallet_percent: U256::from(launch.max_wallet_percent),
        metadata_uri,
        curve_index,
        salt: B256::ZERO,
        allocations: launch
            .allocations
            .iter()
            .map(|a| BurstFactory::DexAllocation {
                dex: a.dex.ordinal(),
                isReward: a.dex == launch.reward_dex,
                allocation: U256::from(a.allocation),
            })
            .collect(),
        creator: launch.creator,
    }
}

// ── TransactionBuilder ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    ledger: LedgerClient,
    pinning: PinningService,
    curve_style: u8,
    default_curve_index: u8,
    confirmations: u64,
    confirmation_timeout: Duration,
    fallback_metadata_uri: String,
}

impl TransactionBuilder {
    pub fn new(ledger: LedgerClient, pinning: PinningService, chain: &ChainConfig, pins: &PinningConfig) -> Self {
        Self {
            ledger,
            pinning,
            curve_style: chain.curve_style,
            default_curve_index: chain.default_curve_index,
            confirmations: chain.confirmations,
            confirmation_timeout: chain.confirmation_timeout,
            fallback_metadata_uri: pins.fallback_metadata_uri.clone(),
        }
    }

    pub fn ledger(&self) -> &LedgerClient {
        &self.ledger
    }

    /// Validate `draft` and launch it. Does not touch the draft store.
    pub async fn launch(&self, draft: &DraftRecord) -> Result<LaunchResult, LaunchError> {
        let launch = validate(draft, self.ledger.signer())?;

        let metadata = TokenMetadata::from_draft(draft);
        let metadata_uri = pin_or_fallback(&self.pinning, &metadata, &self.fallback_metadata_uri).await;

        let curves = self
            .ledger
            .curves()
            .await
            .map_err(|e| LaunchError::SubmissionFailed { tx: None, cause: e.to_string() })?;
        let curve_index =
            select_curve_index(launch.burst_amount, &curves, self.curve_style, self.default_curve_index);
        debug!(burst_amount = launch.burst_amount, curve_index, curves = curves.len(), "curve selected");

        let call = launch_call(&launch, metadata_uri, curve_index);

        let predicted = self
            .ledger
            .simulate(&call)
            .await
            .map_err(|e| LaunchError::SubmissionRejected(e.to_string()))?;
        if predicted == Address::ZERO {
            return Err(LaunchError::SubmissionRejected("simulation returned no token address".into()));
        }

        let tx = self
            .ledger
            .submit(&call)
            .await
            .map_err(|e| LaunchError::SubmissionFailed { tx: None, cause: e.to_string() })?;
        info!(%tx, name = %call.name, symbol = %call.symbol, curve_index, "launch submitted");

        let receipt = tokio::time::timeout(self.confirmation_timeout, self.ledger.wait_for(tx, self.confirmations))
            .await
            .map_err(|_| LaunchError::SubmissionFailed {
                tx: Some(tx),
                cause: format!(
                    "not confirmed within {}s",
                    self.confirmation_timeout.as_secs()
                ),
            })?
            .map_err(|e| LaunchError::SubmissionFailed { tx: Some(tx), cause: e.to_string() })?;

        if !receipt.success {
            return Err(LaunchError::SubmissionFailed { tx: Some(tx), cause: "transaction reverted".into() });
        }

        let token = token_created(&receipt.logs).unwrap_or_else(|| {
            warn!(%tx, "no TokenCreated event in receipt");
            Address::ZERO
        });
        info!(%tx, %token, "launch confirmed");
        Ok(LaunchResult { tx, token })
    }
}
