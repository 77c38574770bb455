//! Solidity types for `EAS.sol`

use alloy_primitives::{Address, Bytes, B256, U256};

alloy_sol_types::sol!(
    #[derive(Debug, PartialEq, Eq)]
    struct AttestationRequestData {
        address recipient;
        uint64 expirationTime;
        bool revocable;
        bytes32 refUID;
        bytes data;
        uint256 value;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct MultiAttestationRequest {
        bytes32 schema;
        AttestationRequestData[] data;
    }

    #[sol(rpc)]
    #[derive(Debug, PartialEq, Eq)]
    interface IEAS {
        event Attested(
            address indexed recipient,
            address indexed attester,
            bytes32 uid,
            bytes32 indexed schemaUID
        );

        function multiAttest(
            MultiAttestationRequest[] calldata multiRequests
        ) external payable returns (bytes32[] memory);
    }
);

/// Attestations issued by the batch attestor never expire.
pub const NO_EXPIRATION: u64 = 0;

impl AttestationRequestData {
    /// Create a request with no expiration and no attached value.
    #[must_use]
    pub fn new(recipient: Address, revocable: bool, ref_uid: B256, data: Bytes) -> Self {
        Self {
            recipient,
            expirationTime: NO_EXPIRATION,
            revocable,
            refUID: ref_uid,
            data,
            value: U256::ZERO,
        }
    }
}

impl MultiAttestationRequest {
    /// Returns the calldata of an `EAS.multiAttest` call carrying only this request.
    #[must_use]
    pub fn multi_attest_calldata(&self) -> Vec<u8> {
        use alloy_sol_types::SolCall;

        IEAS::multiAttestCall {
            multiRequests: vec![self.clone()],
        }
        .abi_encode()
    }
}
