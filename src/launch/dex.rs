//! Liquidity venues a burst token can migrate to.
//!
//! The factory contract identifies venues by a `uint8` ordinal. The mapping
//! is spelled out in [`ORDINALS`] rather than derived from declaration order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Sum of all allocation weights for a complete allocation list (100%).
pub const FULL_ALLOCATION_BPS: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BurstDex {
    Apex,
    Joe,
    Pharaoh,
    Pangolin,
}

/// Venue ↔ on-chain ordinal table.
pub const ORDINALS: [(BurstDex, u8); 4] = [
    (BurstDex::Apex, 0),
    (BurstDex::Joe, 1),
    (BurstDex::Pharaoh, 2),
    (BurstDex::Pangolin, 3),
];

impl BurstDex {
    pub const ALL: [BurstDex; 4] = [
        BurstDex::Apex,
        BurstDex::Joe,
        BurstDex::Pharaoh,
        BurstDex::Pangolin,
    ];

    pub fn ordinal(self) -> u8 {
        ORDINALS
            .iter()
            .find(|(dex, _)| *dex == self)
            .map(|(_, ord)| *ord)
            .unwrap_or_default()
    }

    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        ORDINALS
            .iter()
            .find(|(_, ord)| *ord == ordinal)
            .map(|(dex, _)| *dex)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BurstDex::Apex => "APEX",
            BurstDex::Joe => "JOE",
            BurstDex::Pharaoh => "PHARAOH",
            BurstDex::Pangolin => "PANGOLIN",
        }
    }
}

impl fmt::Display for BurstDex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown dex '{0}' (expected APEX, JOE, PHARAOH or PANGOLIN)")]
pub struct UnknownDex(pub String);

impl FromStr for BurstDex {
    type Err = UnknownDex;

    /// Case-insensitive; tolerates surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        BurstDex::ALL
            .into_iter()
            .find(|dex| dex.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownDex(s.to_string()))
    }
}

/// One venue's share of the launch liquidity, in basis points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DexAllocation {
    pub dex: BurstDex,
    pub allocation: u32,
}

impl DexAllocation {
    pub fn new(dex: BurstDex, allocation: u32) -> Self {
        Self { dex, allocation }
    }
}

/// Sum of weights, widened so a hostile list cannot overflow.
pub fn allocation_total(allocations: &[DexAllocation]) -> u64 {
    allocations.iter().map(|a| u64::from(a.allocation)).sum()
}

pub fn allocations_include(allocations: &[DexAllocation], dex: BurstDex) -> bool {
    allocations.iter().any(|a| a.dex == dex)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_match_factory_enum() {
        assert_eq!(BurstDex::Apex.ordinal(), 0);
        assert_eq!(BurstDex::Joe.ordinal(), 1);
        assert_eq!(BurstDex::Pharaoh.ordinal(), 2);
        assert_eq!(BurstDex::Pangolin.ordinal(), 3);
        for dex in BurstDex::ALL {
            assert_eq!(BurstDex::from_ordinal(dex.ordinal()), Some(dex));
        }
        assert_eq!(BurstDex::from_ordinal(4), None);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("apex".parse::<BurstDex>().unwrap(), BurstDex::Apex);
        assert_eq!(" Pangolin ".parse::<BurstDex>().unwrap(), BurstDex::Pangolin);
        assert!("UNISWAP".parse::<BurstDex>().is_err());
    }

    #[test]
    fn serde_uses_uppercase_names() {
        let json = serde_json::to_string(&DexAllocation::new(BurstDex::Joe, 2500)).unwrap();
        assert_eq!(json, r#"{"dex":"JOE","allocation":2500}"#);
    }

    #[test]
    fn total_and_membership() {
        let allocs = [
            DexAllocation::new(BurstDex::Apex, 6000),
            DexAllocation::new(BurstDex::Joe, 4000),
        ];
        assert_eq!(allocation_total(&allocs), 10_000);
        assert!(allocations_include(&allocs, BurstDex::Joe));
        assert!(!allocations_include(&allocs, BurstDex::Pharaoh));

        let huge = [
            DexAllocation::new(BurstDex::Apex, u32::MAX),
            DexAllocation::new(BurstDex::Joe, u32::MAX),
        ];
        assert_eq!(allocation_total(&huge), 2 * u64::from(u32::MAX));
    }
}
