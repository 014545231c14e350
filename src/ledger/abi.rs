//! Burst factory contract surface: only the pieces the launcher touches.

use alloy::sol;

sol! {
    #[sol(rpc)]
    #[derive(Debug, PartialEq, Eq)]
    contract BurstFactory {
        struct CurveV2 {
            uint8 curveStyle;
            uint256[] binStepScaleFactor;
            uint256 percentOfLP;
            uint256 avaxAtLaunch;
            uint256 basePrice;
        }

        struct CurveWithIndex {
            uint8 index;
            uint256[] distribution;
            CurveV2 curveData;
        }

        struct DexAllocation {
            uint8 dex;
            bool isReward;
            uint256 allocation;
        }

        event TokenCreated(
            address indexed token,
            address indexed creator,
            bool whitelistEnabled,
            uint256 curveIndex
        );

        function getAllCurves() external view returns (CurveWithIndex[] memory);

        function burstTokenWithCreator(
            string memory tokenName,
            string memory tokenSymbol,
            uint256 totalSupply_,
            uint256 tradingFee,
            uint256 maxWalletPercent_,
            string memory metadataURI,
            uint8 curveIndex_,
            bytes32 salt,
            DexAllocation[] memory dexAllocations,
            address creator
        ) external payable returns (address burstAddress);
    }
}

#[cfg(test)]
mod tests {
    use super::BurstFactory::*;
    use alloy::sol_types::{SolCall, SolEvent};

    #[test]
    fn allocations_compare_by_value() {
        let a = DexAllocation { dex: 1, isReward: true, allocation: alloy::primitives::U256::from(10_000) };
        assert_eq!(a.clone(), a);
        assert_ne!(a, DexAllocation { isReward: false, ..a.clone() });
    }

    #[test]
    fn signatures() {
        assert_eq!(
            TokenCreated::SIGNATURE,
            "TokenCreated(address,address,bool,uint256)"
        );
        assert_eq!(
            burstTokenWithCreatorCall::SIGNATURE,
            "burstTokenWithCreator(string,string,uint256,uint256,uint256,string,uint8,bytes32,(uint8,bool,uint256)[],address)"
        );
        assert_eq!(getAllCurvesCall::SIGNATURE, "getAllCurves()");
    }
}
