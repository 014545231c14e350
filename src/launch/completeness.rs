//! Completeness evaluation over a draft. Pure functions, no I/O.

use super::dex::{allocation_total, allocations_include, FULL_ALLOCATION_BPS};
use super::draft::DraftRecord;
use super::fields::{optional_fields, required_fields, validate_field, FieldName};

pub fn missing_required(record: &DraftRecord) -> Vec<FieldName> {
    required_fields()
        .iter()
        .copied()
        .filter(|f| !record.is_set(*f))
        .collect()
}

pub fn missing_optional(record: &DraftRecord) -> Vec<FieldName> {
    optional_fields()
        .iter()
        .copied()
        .filter(|f| !record.is_set(*f))
        .collect()
}

/// Why a draft with all required fields may still not be ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Blocker {
    InvalidField { field: FieldName, reason: String },
    AllocationSum { total: u64 },
    RewardDexNotAllocated,
}

/// Field and cross-field rules, checked only on the fields that are present.
pub fn blockers(record: &DraftRecord) -> Vec<Blocker> {
    let mut out: Vec<Blocker> = required_fields()
        .iter()
        .chain(optional_fields())
        .filter_map(|f| {
            validate_field(*f, record)
                .err()
                .map(|reason| Blocker::InvalidField { field: *f, reason })
        })
        .collect();
    if let Some(allocs) = &record.dex_allocations {
        let total = allocation_total(allocs);
        if total != u64::from(FULL_ALLOCATION_BPS) {
            out.push(Blocker::AllocationSum { total });
        }
        if let Some(reward) = record.reward_dex {
            if !allocations_include(allocs, reward) {
                out.push(Blocker::RewardDexNotAllocated);
            }
        }
    }
    out
}

/// All required fields are present and valid, and the allocation rules hold.
pub fn can_request_confirmation(record: &DraftRecord) -> bool {
    missing_required(record).is_empty() && blockers(record).is_empty()
}

/// Every required and optional field is present. Stricter gate; does not
/// re-check the allocation rules.
pub fn is_complete(record: &DraftRecord) -> bool {
    missing_required(record).is_empty() && missing_optional(record).is_empty()
}

/// Snapshot of all of the above, for prompting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completeness {
    pub missing_required: Vec<FieldName>,
    pub missing_optional: Vec<FieldName>,
    pub blockers: Vec<Blocker>,
}

impl Completeness {
    pub fn of(record: &DraftRecord) -> Self {
        Self {
            missing_required: missing_required(record),
            missing_optional: missing_optional(record),
            blockers: blockers(record),
        }
    }

    pub fn ready(&self) -> bool {
        self.missing_required.is_empty() && self.blockers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launch::dex::{BurstDex, DexAllocation};

    fn happy() -> DraftRecord {
        DraftRecord {
            name: Some("Test".into()),
            symbol: Some("TST".into()),
            total_supply: Some(1_000_000_000),
            description: Some("d".into()),
            burst_amount: Some(300.0),
            dex_allocations: Some(vec![DexAllocation::new(BurstDex::Apex, 10_000)]),
            reward_dex: Some(BurstDex::Apex),
            creator_address: Some("0x742d35Cc6634C0532925a3b844Bc454e4438f44e".into()),
            ..Default::default()
        }
    }

    #[test]
    fn empty_record_misses_everything() {
        let d = DraftRecord::default();
        assert_eq!(missing_required(&d), required_fields().to_vec());
        assert_eq!(missing_optional(&d), optional_fields().to_vec());
        assert!(!can_request_confirmation(&d));
        assert!(!is_complete(&d));
    }

    #[test]
    fn happy_path_is_ready() {
        let d = happy();
        assert!(missing_required(&d).is_empty());
        assert!(can_request_confirmation(&d));
        assert!(!is_complete(&d));
    }

    #[test]
    fn evaluation_is_idempotent() {
        let d = DraftRecord { name: Some("A".into()), ..Default::default() };
        assert_eq!(missing_required(&d), missing_required(&d));
    }

    #[test]
    fn allocation_sum_blocks_confirmation() {
        let d = DraftRecord {
            dex_allocations: Some(vec![
                DexAllocation::new(BurstDex::Apex, 6000),
                DexAllocation::new(BurstDex::Joe, 3000),
            ]),
            ..happy()
        };
        assert!(missing_required(&d).is_empty());
        assert!(!can_request_confirmation(&d));
        assert_eq!(blockers(&d), vec![Blocker::AllocationSum { total: 9000 }]);
    }

    #[test]
    fn reward_dex_must_be_allocated() {
        let d = DraftRecord {
            dex_allocations: Some(vec![DexAllocation::new(BurstDex::Joe, 10_000)]),
            reward_dex: Some(BurstDex::Apex),
            ..happy()
        };
        assert!(!can_request_confirmation(&d));
        assert_eq!(blockers(&d), vec![Blocker::RewardDexNotAllocated]);
    }

    #[test]
    fn empty_allocation_list_is_blocked() {
        let d = DraftRecord { dex_allocations: Some(vec![]), ..happy() };
        assert!(!can_request_confirmation(&d));
    }

    #[test]
    fn present_but_invalid_fields_block_confirmation() {
        let d = DraftRecord {
            symbol: Some("WAYTOOLONGSYM".into()),
            creator_address: Some("0x1234".into()),
            trading_fee: Some(9000),
            ..happy()
        };
        assert!(missing_required(&d).is_empty());
        assert!(!can_request_confirmation(&d));
        let fields: Vec<FieldName> = blockers(&d)
            .into_iter()
            .filter_map(|b| match b {
                Blocker::InvalidField { field, .. } => Some(field),
                _ => None,
            })
            .collect();
        assert_eq!(
            fields,
            vec![FieldName::Symbol, FieldName::CreatorAddress, FieldName::TradingFee]
        );
    }

    #[test]
    fn fully_filled_is_complete() {
        let d = DraftRecord {
            trading_fee: Some(0),
            max_wallet_percent: Some(10_000),
            image_prompt: Some("a fox".into()),
            website: Some("https://example.com".into()),
            twitter: Some("@t".into()),
            telegram: Some("@tg".into()),
            discord: Some("https://discord.gg/x".into()),
            ..happy()
        };
        assert!(is_complete(&d));
        assert!(Completeness::of(&d).ready());
    }
}
