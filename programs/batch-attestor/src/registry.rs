//! Schema registry lookups.

use alloy_primitives::{Address, B256};
use alloy_provider::DynProvider;
use async_trait::async_trait;
use eas_batch_solidity_types::schema_registry::{ISchemaRegistry, SchemaRecord};

use crate::error::BatchError;

/// Fetches schema records by UID.
#[async_trait]
pub trait SchemaRegistry: Send + Sync {
    async fn get_schema(&self, uid: B256) -> Result<SchemaRecord, BatchError>;
}

/// Reads schema records from the on-chain `SchemaRegistry` contract.
#[derive(Clone, Debug)]
pub struct RegistryClient {
    registry: ISchemaRegistry::ISchemaRegistryInstance<DynProvider>,
}

impl RegistryClient {
    #[must_use]
    pub fn new(provider: DynProvider, address: Address) -> Self {
        Self {
            registry: ISchemaRegistry::new(address, provider),
        }
    }
}

#[async_trait]
impl SchemaRegistry for RegistryClient {
    #[tracing::instrument(skip(self))]
    async fn get_schema(&self, uid: B256) -> Result<SchemaRecord, BatchError> {
        let record = self
            .registry
            .getSchema(uid)
            .call()
            .await
            .map_err(|e| BatchError::Registry(e.to_string()))?;

        if !record.is_registered() {
            return Err(BatchError::Registry(format!("schema {uid} is not registered")));
        }
        tracing::debug!(schema = %record.schema, revocable = record.revocable, "fetched schema");
        Ok(record)
    }
}
