use alloy_primitives::{Address, TxHash, B256};
use alloy_network::ReceiptResponse as _;
use alloy_provider::DynProvider;
use alloy_rpc_types_eth::Log;
use async_trait::async_trait;
use eas_batch_solidity_types::eas::{MultiAttestationRequest, IEAS};
use futures::future::{BoxFuture, FutureExt};

use crate::error::{BatchError, SubmissionStage};

/// A sent `multiAttest` transaction whose attestation UIDs are not known yet.
pub struct PendingAttestation {
    pub tx_hash: TxHash,
    /// Resolves to the UIDs assigned by the contract once the transaction is mined.
    pub confirmation: BoxFuture<'static, Result<Vec<B256>, BatchError>>,
}

impl std::fmt::Debug for PendingAttestation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingAttestation")
            .field("tx_hash", &self.tx_hash)
            .finish_non_exhaustive()
    }
}

/// Submits multi-attestation requests to an EAS deployment.
#[async_trait]
pub trait AttestationClient: Send + Sync {
    /// The address of the EAS contract requests are sent to.
    fn eas_address(&self) -> Address;

    async fn multi_attest(
        &self,
        requests: Vec<MultiAttestationRequest>,
    ) -> Result<PendingAttestation, BatchError>;
}

/// Sends `multiAttest` through a wallet-backed provider.
#[derive(Clone, Debug)]
pub struct EasClient {
    eas: IEAS::IEASInstance<DynProvider>,
}

impl EasClient {
    #[must_use]
    pub fn new(provider: DynProvider, address: Address) -> Self {
        Self {
            eas: IEAS::new(address, provider),
        }
    }
}

/// Collect the UIDs of all `Attested` events in `logs`, in log order.
pub fn attested_uids(logs: &[Log]) -> Vec<B256> {
    logs.iter()
        .filter_map(|log| log.log_decode::<IEAS::Attested>().ok())
        .map(|log| log.inner.data.uid)
        .collect()
}

#[async_trait]
impl AttestationClient for EasClient {
    fn eas_address(&self) -> Address {
        *self.eas.address()
    }

    async fn multi_attest(
        &self,
        requests: Vec<MultiAttestationRequest>,
    ) -> Result<PendingAttestation, BatchError> {
        let pending = self
            .eas
            .multiAttest(requests)
            .send()
            .await
            .map_err(|e| BatchError::submission(SubmissionStage::Attesting, e))?;
        let tx_hash = *pending.tx_hash();
        tracing::info!(%tx_hash, "multiAttest transaction sent");

        let confirmation = async move {
            let receipt = pending
                .get_receipt()
                .await
                .map_err(|e| BatchError::submission(SubmissionStage::WaitUid, e))?;
            if !receipt.status() {
                return Err(BatchError::submission(
                    SubmissionStage::WaitUid,
                    format!("transaction {tx_hash} reverted"),
                ));
            }
            Ok(attested_uids(receipt.inner.logs()))
        }
        .boxed();

        Ok(PendingAttestation {
            tx_hash,
            confirmation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, LogData};
    use alloy_sol_types::SolEvent;

    fn attested_log(uid: B256) -> Log {
        let event = IEAS::Attested {
            recipient: address!("0x00000000000000000000000000000000000000aa"),
            attester: address!("0x00000000000000000000000000000000000000bb"),
            uid,
            schemaUID: B256::repeat_byte(0x11),
        };
        let data: LogData = event.encode_log_data();
        Log {
            inner: alloy_primitives::Log {
                address: address!("0x00000000000000000000000000000000000000cc"),
                data,
            },
            ..Default::default()
        }
    }

    #[test]
    fn collects_uids_from_attested_events_only() {
        let unrelated = Log {
            inner: alloy_primitives::Log {
                address: Address::ZERO,
                data: LogData::new_unchecked(vec![B256::repeat_byte(0xff)], Default::default()),
            },
            ..Default::default()
        };

        let logs = vec![
            attested_log(B256::repeat_byte(1)),
            unrelated,
            attested_log(B256::repeat_byte(2)),
        ];
        assert_eq!(
            attested_uids(&logs),
            vec![B256::repeat_byte(1), B256::repeat_byte(2)]
        );
    }
}
