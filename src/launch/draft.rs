//! Draft record accumulated across conversation turns, and the partial
//! update produced by one extraction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::dex::{BurstDex, DexAllocation};
use super::fields::FieldName;

/// One user's in-progress launch request.
///
/// All user fields start unset. The control fields belong to the
/// aggregator and are never touched by [`DraftRecord::merge`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftRecord {
    pub name: Option<String>,
    pub symbol: Option<String>,
    /// Whole tokens, before the 18-decimal scaling.
    pub total_supply: Option<u64>,
    pub description: Option<String>,
    /// AVAX raised before the token bursts.
    pub burst_amount: Option<f64>,
    pub dex_allocations: Option<Vec<DexAllocation>>,
    pub reward_dex: Option<BurstDex>,
    pub creator_address: Option<String>,
    /// Basis points.
    pub trading_fee: Option<u32>,
    /// Basis points.
    pub max_wallet_percent: Option<u32>,
    pub image_prompt: Option<String>,
    pub website: Option<String>,
    pub twitter: Option<String>,
    pub telegram: Option<String>,
    pub discord: Option<String>,

    #[serde(default)]
    pub received_token_request: bool,
    #[serde(default)]
    pub has_requested_confirmation: bool,
    pub is_confirmed: Option<bool>,
    pub last_updated: Option<DateTime<Utc>>,
}

fn present(s: &Option<String>) -> bool {
    s.as_deref().is_some_and(|s| !s.is_empty())
}

impl DraftRecord {
    /// Whether `field` holds a value. Empty strings count as unset.
    pub fn is_set(&self, field: FieldName) -> bool {
        match field {
            FieldName::Name => present(&self.name),
            FieldName::Symbol => present(&self.symbol),
            FieldName::TotalSupply => self.total_supply.is_some(),
            FieldName::Description => present(&self.description),
            FieldName::BurstAmount => self.burst_amount.is_some(),
            FieldName::DexAllocations => self.dex_allocations.is_some(),
            FieldName::RewardDex => self.reward_dex.is_some(),
            FieldName::CreatorAddress => present(&self.creator_address),
            FieldName::TradingFee => self.trading_fee.is_some(),
            FieldName::MaxWalletPercent => self.max_wallet_percent.is_some(),
            FieldName::ImagePrompt => present(&self.image_prompt),
            FieldName::Website => present(&self.website),
            FieldName::Twitter => present(&self.twitter),
            FieldName::Telegram => present(&self.telegram),
            FieldName::Discord => present(&self.discord),
            FieldName::ReceivedTokenRequest => self.received_token_request,
            FieldName::HasRequestedConfirmation => self.has_requested_confirmation,
            FieldName::IsConfirmed => self.is_confirmed.is_some(),
            FieldName::LastUpdated => self.last_updated.is_some(),
        }
    }

    /// True when nothing has been recorded for this user yet.
    pub fn is_untouched(&self) -> bool {
        *self == DraftRecord::default()
    }

    /// Overwrite every field the update carries. Returns the fields whose
    /// value actually changed.
    pub fn merge(&mut self, update: &PartialDraft) -> Vec<FieldName> {
        let mut changed = Vec::new();

        fn put<T: PartialEq + Clone>(
            slot: &mut Option<T>,
            value: &Option<T>,
            field: FieldName,
            changed: &mut Vec<FieldName>,
        ) {
            if let Some(v) = value {
                if slot.as_ref() != Some(v) {
                    *slot = Some(v.clone());
                    changed.push(field);
                }
            }
        }

        put(&mut self.name, &update.name, FieldName::Name, &mut changed);
        put(&mut self.symbol, &update.symbol, FieldName::Symbol, &mut changed);
        put(&mut self.total_supply, &update.total_supply, FieldName::TotalSupply, &mut changed);
        put(&mut self.description, &update.description, FieldName::Description, &mut changed);
        put(&mut self.burst_amount, &update.burst_amount, FieldName::BurstAmount, &mut changed);
        put(&mut self.dex_allocations, &update.dex_allocations, FieldName::DexAllocations, &mut changed);
        put(&mut self.reward_dex, &update.reward_dex, FieldName::RewardDex, &mut changed);
        put(&mut self.creator_address, &update.creator_address, FieldName::CreatorAddress, &mut changed);
        put(&mut self.trading_fee, &update.trading_fee, FieldName::TradingFee, &mut changed);
        put(&mut self.max_wallet_percent, &update.max_wallet_percent, FieldName::MaxWalletPercent, &mut changed);
        put(&mut self.image_prompt, &update.image_prompt, FieldName::ImagePrompt, &mut changed);
        put(&mut self.website, &update.website, FieldName::Website, &mut changed);
        put(&mut self.twitter, &update.twitter, FieldName::Twitter, &mut changed);
        put(&mut self.telegram, &update.telegram, FieldName::Telegram, &mut changed);
        put(&mut self.discord, &update.discord, FieldName::Discord, &mut changed);

        changed
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_updated = Some(now);
    }
}

// ── PartialDraft ─────────────────────────────────────────────────────────────

/// Fields recovered from one utterance. `None` means "not mentioned".
///
/// Built only through [`PartialDraft::from_json`] or field by field; blank
/// strings and empty allocation lists never make it in, so every `Some` is a
/// real value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialDraft {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub total_supply: Option<u64>,
    pub description: Option<String>,
    pub burst_amount: Option<f64>,
    pub dex_allocations: Option<Vec<DexAllocation>>,
    pub reward_dex: Option<BurstDex>,
    pub creator_address: Option<String>,
    pub trading_fee: Option<u32>,
    pub max_wallet_percent: Option<u32>,
    pub image_prompt: Option<String>,
    pub website: Option<String>,
    pub twitter: Option<String>,
    pub telegram: Option<String>,
    pub discord: Option<String>,
}

impl PartialDraft {
    pub fn is_empty(&self) -> bool {
        *self == PartialDraft::default()
    }

    /// Lenient conversion of an extraction object.
    ///
    /// Unknown keys and control fields are ignored, values of the wrong shape
    /// are dropped, and a non-object input yields an empty update.
    pub fn from_json(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            debug!("extraction output is not an object; ignoring");
            return Self::default();
        };

        for key in obj.keys() {
            match key.parse::<FieldName>() {
                Ok(f) if f.is_control() => debug!(field = %f, "ignoring control field in extraction"),
                Ok(_) => {}
                Err(_) => debug!(key = %key, "ignoring unknown extraction key"),
            }
        }

        Self {
            name: text(obj, FieldName::Name),
            symbol: text(obj, FieldName::Symbol),
            total_supply: obj.get("totalSupply").and_then(whole).filter(|n| *n > 0),
            description: text(obj, FieldName::Description),
            burst_amount: obj.get("burstAmount").and_then(decimal),
            dex_allocations: obj.get("dexAllocations").and_then(allocations),
            reward_dex: obj.get("rewardDex").and_then(dex),
            creator_address: text(obj, FieldName::CreatorAddress),
            trading_fee: obj.get("tradingFee").and_then(whole).and_then(|n| u32::try_from(n).ok()),
            max_wallet_percent: obj
                .get("maxWalletPercent")
                .and_then(whole)
                .and_then(|n| u32::try_from(n).ok()),
            image_prompt: text(obj, FieldName::ImagePrompt),
            website: text(obj, FieldName::Website),
            twitter: text(obj, FieldName::Twitter),
            telegram: text(obj, FieldName::Telegram),
            discord: text(obj, FieldName::Discord),
        }
    }
}

fn text(obj: &Map<String, Value>, field: FieldName) -> Option<String> {
    match obj.get(field.as_str())? {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Non-negative integer from a JSON number or a numeric string
/// (`"1,000,000"` is accepted). Fractions are rejected.
fn whole(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0 && *f < u64::MAX as f64)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().replace([',', '_'], "").parse().ok(),
        _ => None,
    }
}

fn decimal(v: &Value) -> Option<f64> {
    let f = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    (f.is_finite() && f >= 0.0).then_some(f)
}

fn dex(v: &Value) -> Option<BurstDex> {
    match v {
        Value::String(s) => match s.parse() {
            Ok(dex) => Some(dex),
            Err(e) => {
                warn!("dropping venue: {e}");
                None
            }
        },
        Value::Number(n) => n
            .as_u64()
            .and_then(|o| u8::try_from(o).ok())
            .and_then(BurstDex::from_ordinal),
        _ => None,
    }
}

fn allocations(v: &Value) -> Option<Vec<DexAllocation>> {
    let list: Vec<DexAllocation> = v
        .as_array()?
        .iter()
        .filter_map(|entry| {
            let venue = dex(entry.get("dex")?)?;
            let weight = entry
                .get("allocation")
                .and_then(whole)
                .and_then(|n| u32::try_from(n).ok())?;
            Some(DexAllocation::new(venue, weight))
        })
        .collect();
    (!list.is_empty()).then_some(list)
}
