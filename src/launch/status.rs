//! Plain-text replies: progress reports, the confirmation summary and
//! launch results.

use std::fmt::Write as _;

use super::aggregator::TurnOutcome;
use super::builder::LaunchResult;
use super::completeness::{Blocker, Completeness};
use super::dex::{DexAllocation, FULL_ALLOCATION_BPS};
use super::draft::DraftRecord;
use super::fields::{guidance, optional_fields, required_fields, FieldName};
use crate::ledger::{burst_page_url, Network};

/// Basis points as a percentage, `125` → `1.25%`.
pub fn percent(bps: u32) -> String {
    let whole = bps / 100;
    let frac = bps % 100;
    if frac == 0 {
        format!("{whole}%")
    } else {
        let s = format!("{whole}.{frac:02}");
        format!("{}%", s.trim_end_matches('0'))
    }
}

fn allocations_line(allocations: &[DexAllocation]) -> String {
    allocations
        .iter()
        .map(|a| format!("{} {}", a.dex, percent(a.allocation)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Human-readable value of a user field, `None` when unset.
pub fn display_value(record: &DraftRecord, field: FieldName) -> Option<String> {
    if !record.is_set(field) {
        return None;
    }
    match field {
        FieldName::Name => record.name.clone(),
        FieldName::Symbol => record.symbol.clone(),
        FieldName::TotalSupply => record.total_supply.map(|n| n.to_string()),
        FieldName::Description => record.description.clone(),
        FieldName::BurstAmount => record.burst_amount.map(|a| format!("{a} AVAX")),
        FieldName::DexAllocations => record.dex_allocations.as_deref().map(allocations_line),
        FieldName::RewardDex => record.reward_dex.map(|d| d.to_string()),
        FieldName::CreatorAddress => record.creator_address.clone(),
        FieldName::TradingFee => record.trading_fee.map(percent),
        FieldName::MaxWalletPercent => record.max_wallet_percent.map(percent),
        FieldName::ImagePrompt => record.image_prompt.clone(),
        FieldName::Website => record.website.clone(),
        FieldName::Twitter => record.twitter.clone(),
        FieldName::Telegram => record.telegram.clone(),
        FieldName::Discord => record.discord.clone(),
        FieldName::ReceivedTokenRequest
        | FieldName::HasRequestedConfirmation
        | FieldName::IsConfirmed
        | FieldName::LastUpdated => None,
    }
}

fn field_lines(out: &mut String, record: &DraftRecord, fields: &[FieldName]) {
    for f in fields {
        if let Some(v) = display_value(record, *f) {
            let _ = writeln!(out, "- {f}: {v}");
        }
    }
}

fn missing_lines(out: &mut String, fields: &[FieldName]) {
    for f in fields {
        match guidance(*f) {
            Ok(g) => {
                let _ = writeln!(out, "- {f}: {} (e.g. {})", g.description, g.valid_example);
            }
            Err(_) => {
                let _ = writeln!(out, "- {f}");
            }
        }
    }
}

fn blocker_line(blocker: &Blocker) -> String {
    match blocker {
        Blocker::InvalidField { field, reason } => format!("{field} {reason}"),
        Blocker::AllocationSum { total } => format!(
            "DEX allocations add up to {}, they must add up to {}",
            percent(u32::try_from(*total).unwrap_or(u32::MAX)),
            percent(FULL_ALLOCATION_BPS)
        ),
        Blocker::RewardDexNotAllocated => "the reward DEX must be one of the allocation DEXs".to_string(),
    }
}

/// What is known, what is missing and what is wrong.
pub fn render_report(record: &DraftRecord) -> String {
    let report = Completeness::of(record);
    let mut out = String::new();

    let any_set = required_fields()
        .iter()
        .chain(optional_fields())
        .any(|f| record.is_set(*f));
    if any_set {
        out.push_str("Current information:\n");
        field_lines(&mut out, record, required_fields());
        field_lines(&mut out, record, optional_fields());
        out.push('\n');
    }

    if !report.missing_required.is_empty() {
        out.push_str("Still needed:\n");
        missing_lines(&mut out, &report.missing_required);
        out.push('\n');
    }

    if !report.blockers.is_empty() {
        out.push_str("Needs fixing:\n");
        for b in &report.blockers {
            let _ = writeln!(out, "- {}", blocker_line(b));
        }
        out.push('\n');
    }

    if !report.missing_optional.is_empty() {
        out.push_str("Optional:\n");
        missing_lines(&mut out, &report.missing_optional);
    }

    out.trim_end().to_string()
}

/// Summary shown when asking the user to confirm the launch.
pub fn confirmation_summary(record: &DraftRecord) -> String {
    let mut out = String::from("Everything is ready. Please review your token:\n");
    field_lines(&mut out, record, required_fields());
    field_lines(&mut out, record, optional_fields());
    out.push_str("\nReply \"yes\" to launch or \"no\" to cancel.");
    out
}

pub fn launched_message(draft: &DraftRecord, result: &LaunchResult, network: Network) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Created token for {}",
        draft.creator_address.as_deref().unwrap_or_default()
    );
    let _ = writeln!(out, "Name: {}", draft.name.as_deref().unwrap_or_default());
    let _ = writeln!(out, "Symbol: {}", draft.symbol.as_deref().unwrap_or_default());
    if result.token_known() {
        let _ = writeln!(out, "CA: {}", network.address_url(result.token));
    } else {
        out.push_str("CA: unknown, no creation event was found; check the transaction\n");
    }
    let _ = write!(out, "TX: {}", network.tx_url(result.tx));
    if result.token_known() {
        let _ = write!(out, "\nLink: {}", burst_page_url(result.token));
    }
    out
}

/// Reply for one turn, `None` when the message was not about a launch.
pub fn render_outcome(outcome: &TurnOutcome, network: Network) -> Option<String> {
    let text = match outcome {
        TurnOutcome::Ignored => return None,
        TurnOutcome::Collecting { draft, .. } => {
            format!("Let's set up your token.\n\n{}", render_report(draft))
        }
        TurnOutcome::AwaitingConfirmation { draft, .. } => {
            if Completeness::of(draft).ready() {
                confirmation_summary(draft)
            } else {
                format!("Almost there.\n\n{}", render_report(draft))
            }
        }
        TurnOutcome::Cancelled { existed: true } => {
            "Token creation cancelled. Your draft has been cleared.".to_string()
        }
        TurnOutcome::Cancelled { existed: false } => "There is no token launch in progress.".to_string(),
        TurnOutcome::Launched { draft, result } => launched_message(draft, result, network),
        TurnOutcome::Rejected { error, .. } => {
            format!("I can't launch this yet: {error}. Tell me the corrected value and confirm again.")
        }
        TurnOutcome::Failed { error, .. } => format!(
            "The launch did not go through: {error}. Your details are saved; reply \"yes\" to retry or \"cancel\" to start over."
        ),
    };
    Some(text)
}
