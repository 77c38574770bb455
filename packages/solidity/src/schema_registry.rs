//! Solidity types for `SchemaRegistry.sol`

use alloy_primitives::B256;

alloy_sol_types::sol!(
    #[derive(Debug, PartialEq, Eq)]
    struct SchemaRecord {
        bytes32 uid;
        address resolver;
        bool revocable;
        string schema;
    }

    #[sol(rpc)]
    #[derive(Debug, PartialEq, Eq)]
    interface ISchemaRegistry {
        function getSchema(bytes32 uid) external view returns (SchemaRecord memory);
    }
);

impl SchemaRecord {
    /// The registry returns a zeroed record for unknown schema UIDs.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.uid != B256::ZERO
    }
}
