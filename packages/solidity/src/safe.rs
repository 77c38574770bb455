//! Solidity types for the Safe multisig wallet (v1.3.0 and later).

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::{eip712_domain, SolStruct};

alloy_sol_types::sol!(
    /// The EIP-712 struct a Safe owner signs to approve a transaction.
    #[derive(Debug, PartialEq, Eq)]
    struct SafeTx {
        address to;
        uint256 value;
        bytes data;
        uint8 operation;
        uint256 safeTxGas;
        uint256 baseGas;
        uint256 gasPrice;
        address gasToken;
        address refundReceiver;
        uint256 nonce;
    }

    #[sol(rpc)]
    #[derive(Debug, PartialEq, Eq)]
    interface ISafe {
        function nonce() external view returns (uint256);
    }
);

/// `Enum.Operation.Call` in the Safe contracts.
pub const OPERATION_CALL: u8 = 0;

impl SafeTx {
    /// Create a plain call transaction with no gas refund.
    #[must_use]
    pub fn call(to: Address, data: Bytes, nonce: U256) -> Self {
        Self {
            to,
            value: U256::ZERO,
            data,
            operation: OPERATION_CALL,
            safeTxGas: U256::ZERO,
            baseGas: U256::ZERO,
            gasPrice: U256::ZERO,
            gasToken: Address::ZERO,
            refundReceiver: Address::ZERO,
            nonce,
        }
    }

    /// The `safeTxHash` owners sign, bound to `safe` on `chain_id`.
    #[must_use]
    pub fn safe_tx_hash(&self, chain_id: u64, safe: Address) -> B256 {
        let domain = eip712_domain! {
            chain_id: chain_id,
            verifying_contract: safe,
        };
        self.eip712_signing_hash(&domain)
    }
}
