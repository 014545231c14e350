//! Field catalog: which launch fields are required, which are optional, and
//! the guidance text used when asking the user for them.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::draft::DraftRecord;

pub const MAX_NAME_CHARS: usize = 50;
pub const MAX_SYMBOL_CHARS: usize = 10;
/// 5% in basis points.
pub const MAX_TRADING_FEE_BPS: u32 = 500;
pub const MAX_WALLET_BPS: u32 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("unknown field: {0}")]
    UnknownField(String),
}

/// Every field a draft carries, including the control fields the user never
/// supplies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldName {
    Name,
    Symbol,
    TotalSupply,
    Description,
    BurstAmount,
    DexAllocations,
    RewardDex,
    CreatorAddress,
    TradingFee,
    MaxWalletPercent,
    ImagePrompt,
    Website,
    Twitter,
    Telegram,
    Discord,
    ReceivedTokenRequest,
    HasRequestedConfirmation,
    IsConfirmed,
    LastUpdated,
}

const REQUIRED: [FieldName; 8] = [
    FieldName::Name,
    FieldName::Symbol,
    FieldName::TotalSupply,
    FieldName::Description,
    FieldName::BurstAmount,
    FieldName::DexAllocations,
    FieldName::RewardDex,
    FieldName::CreatorAddress,
];

const OPTIONAL: [FieldName; 7] = [
    FieldName::TradingFee,
    FieldName::MaxWalletPercent,
    FieldName::ImagePrompt,
    FieldName::Website,
    FieldName::Twitter,
    FieldName::Telegram,
    FieldName::Discord,
];

const CONTROL: [FieldName; 4] = [
    FieldName::ReceivedTokenRequest,
    FieldName::HasRequestedConfirmation,
    FieldName::IsConfirmed,
    FieldName::LastUpdated,
];

/// Required fields in prompting order.
pub fn required_fields() -> &'static [FieldName] {
    &REQUIRED
}

/// Optional fields in prompting order.
pub fn optional_fields() -> &'static [FieldName] {
    &OPTIONAL
}

impl FieldName {
    /// Wire name used in extraction output and persisted drafts.
    pub fn as_str(self) -> &'static str {
        match self {
            FieldName::Name => "name",
            FieldName::Symbol => "symbol",
            FieldName::TotalSupply => "totalSupply",
            FieldName::Description => "description",
            FieldName::BurstAmount => "burstAmount",
            FieldName::DexAllocations => "dexAllocations",
            FieldName::RewardDex => "rewardDex",
            FieldName::CreatorAddress => "creatorAddress",
            FieldName::TradingFee => "tradingFee",
            FieldName::MaxWalletPercent => "maxWalletPercent",
            FieldName::ImagePrompt => "imagePrompt",
            FieldName::Website => "website",
            FieldName::Twitter => "twitter",
            FieldName::Telegram => "telegram",
            FieldName::Discord => "discord",
            FieldName::ReceivedTokenRequest => "receivedTokenRequest",
            FieldName::HasRequestedConfirmation => "hasRequestedConfirmation",
            FieldName::IsConfirmed => "isConfirmed",
            FieldName::LastUpdated => "lastUpdated",
        }
    }

    /// Control fields are owned by the state machine and never merged from
    /// extraction output.
    pub fn is_control(self) -> bool {
        CONTROL.contains(&self)
    }

    pub fn is_required(self) -> bool {
        REQUIRED.contains(&self)
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldName {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        REQUIRED
            .iter()
            .chain(OPTIONAL.iter())
            .chain(CONTROL.iter())
            .copied()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| CatalogError::UnknownField(s.to_string()))
    }
}

// ── Guidance ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Guidance {
    pub description: &'static str,
    pub valid_example: &'static str,
    pub invalid_example: &'static str,
    pub instructions: &'static str,
}

const fn g(
    description: &'static str,
    valid_example: &'static str,
    invalid_example: &'static str,
    instructions: &'static str,
) -> Guidance {
    Guidance { description, valid_example, invalid_example, instructions }
}

/// Guidance for a user-facing field. Control fields have none.
pub fn guidance(field: FieldName) -> Result<Guidance, CatalogError> {
    let tuple = match field {
        FieldName::Name => g(
            "The name of the token",
            "Apex DeFi, Bitcoin, sAVAX. At most 50 characters",
            "names longer than 50 characters",
            "Only when the user directly states the token name",
        ),
        FieldName::Symbol => g(
            "The symbol (ticker) of the token",
            "APEX, BTC, ggAVAX. At most 10 characters",
            "symbols longer than 10 characters",
            "Only when the user directly states the token symbol",
        ),
        FieldName::TotalSupply => g(
            "The total supply of the token",
            "1000000, 314k, 1 million, 100b. A positive whole number",
            "-1, 0, 100.5",
            "Only when the user states the supply; expand shorthand such as 1m to 1000000",
        ),
        FieldName::Description => g(
            "The description of the token",
            "A community token for sunset chasers",
            "a bare link to a website or social account",
            "Only when the user directly describes the token",
        ),
        FieldName::BurstAmount => g(
            "The amount of AVAX raised before the token bursts to the DEXs",
            "50 to 2000 in steps of 5, e.g. 50, 55, 300",
            "45, 2001, 45.5, 0",
            "Only when the user directly states the burst amount in AVAX",
        ),
        FieldName::DexAllocations => g(
            "How the launch liquidity is split across DEXs",
            "APEX 50%, JOE 20%, PHARAOH 20%, PANGOLIN 10%. Must total 100%",
            "UNISWAP 100%, APEX 101%, totals other than 100%",
            "Return a list of {dex, allocation} with allocation in basis points (1% = 100)",
        ),
        FieldName::RewardDex => g(
            "The DEX whose LP tokens fund single sided staking rewards",
            "APEX, JOE, PHARAOH or PANGOLIN. Must be one of the allocation DEXs",
            "UNISWAP, SUSHI",
            "Only when the user names exactly one reward DEX",
        ),
        FieldName::CreatorAddress => g(
            "The wallet address that will own the token",
            "0x742d35Cc6634C0532925a3b844Bc454e4438f44e",
            "0x1234, addresses that are not 40 hex digits",
            "Only when the user directly states an address",
        ),
        FieldName::TradingFee => g(
            "The trading fee charged on swaps",
            "0% to 5%, e.g. 1.25%",
            "6%, -1%",
            "Return basis points (1% = 100), between 0 and 500",
        ),
        FieldName::MaxWalletPercent => g(
            "The largest share of supply one wallet may hold",
            "0% to 100%, e.g. 2.5%",
            "101%, -1%",
            "Return basis points (1% = 100), between 0 and 10000",
        ),
        FieldName::ImagePrompt => g(
            "A prompt describing the token logo",
            "a neon fox on a purple background",
            "an empty prompt",
            "Only when the user describes how the logo should look",
        ),
        FieldName::Website => g(
            "The website of the token",
            "https://example.com",
            "example.com",
            "Only when the user directly states the website",
        ),
        FieldName::Twitter => g(
            "The X/Twitter account of the token",
            "https://x.com/example, @example",
            "example",
            "Only when the user directly states the account",
        ),
        FieldName::Telegram => g(
            "The Telegram group of the token",
            "https://t.me/example, @example",
            "example",
            "Only when the user directly states the group",
        ),
        FieldName::Discord => g(
            "The Discord server of the token",
            "https://discord.gg/example",
            "example",
            "Only when the user directly states the invite link",
        ),
        FieldName::ReceivedTokenRequest
        | FieldName::HasRequestedConfirmation
        | FieldName::IsConfirmed
        | FieldName::LastUpdated => {
            return Err(CatalogError::UnknownField(field.as_str().to_string()));
        }
    };
    Ok(tuple)
}

// ── Validation ───────────────────────────────────────────────────────────────

fn bounded_text(text: &str, max: usize) -> Result<(), String> {
    let len = text.chars().count();
    if len == 0 || len > max {
        return Err(format!("must be 1 to {max} characters, got {len}"));
    }
    Ok(())
}

/// `0x` followed by exactly 40 hex digits.
pub fn is_hex_address(s: &str) -> bool {
    s.len() == 42 && s.starts_with("0x") && s[2..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Per-field rule for the value `record` holds. An unset field passes; use
/// the completeness checks for presence. Allocation totals and reward
/// membership span two fields and live in `completeness::blockers`.
pub fn validate_field(field: FieldName, record: &DraftRecord) -> Result<(), String> {
    match field {
        FieldName::Name => record.name.as_deref().map_or(Ok(()), |n| bounded_text(n, MAX_NAME_CHARS)),
        FieldName::Symbol => record.symbol.as_deref().map_or(Ok(()), |s| bounded_text(s, MAX_SYMBOL_CHARS)),
        FieldName::CreatorAddress => match record.creator_address.as_deref() {
            Some(a) if !is_hex_address(a.trim()) => Err("must be 0x followed by 40 hex digits".into()),
            _ => Ok(()),
        },
        FieldName::TotalSupply => match record.total_supply {
            Some(0) => Err("must be greater than 0".into()),
            _ => Ok(()),
        },
        FieldName::BurstAmount => match record.burst_amount {
            Some(a) if !(a.is_finite() && a > 0.0) => Err("must be a positive amount of AVAX".into()),
            _ => Ok(()),
        },
        FieldName::DexAllocations => match record.dex_allocations.as_deref() {
            Some([]) => Err("at least one DEX is required".into()),
            _ => Ok(()),
        },
        FieldName::TradingFee => match record.trading_fee {
            Some(fee) if fee > MAX_TRADING_FEE_BPS => {
                Err(format!("must be between 0 and {MAX_TRADING_FEE_BPS} basis points"))
            }
            _ => Ok(()),
        },
        FieldName::MaxWalletPercent => match record.max_wallet_percent {
            Some(bps) if bps > MAX_WALLET_BPS => {
                Err(format!("must be between 0 and {MAX_WALLET_BPS} basis points"))
            }
            _ => Ok(()),
        },
        _ => Ok(()),
    }
}

/// Guidance looked up by wire name.
pub fn guidance_for(name: &str) -> Result<Guidance, CatalogError> {
    guidance(name.parse()?)
}
