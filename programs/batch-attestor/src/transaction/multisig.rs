use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_provider::DynProvider;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use eas_batch_keys::{
    recover::recover_signer,
    signature::{sign_digest, to_safe_signature},
};
use eas_batch_solidity_types::{
    eas::MultiAttestationRequest,
    safe::{ISafe, SafeTx},
};
use serde::Serialize;
use url::Url;

use crate::error::{BatchError, SubmissionStage};

/// A Safe transaction wrapping a `multiAttest` call, not yet signed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnsignedSafeTransaction {
    pub tx: SafeTx,
    pub safe_tx_hash: B256,
}

/// Wrap `request` into a Safe transaction calling `eas` and compute its hash.
#[must_use]
pub fn prepare_safe_transaction(
    request: &MultiAttestationRequest,
    eas: Address,
    nonce: U256,
    chain_id: u64,
    safe: Address,
) -> UnsignedSafeTransaction {
    let tx = SafeTx::call(eas, request.multi_attest_calldata().into(), nonce);
    let safe_tx_hash = tx.safe_tx_hash(chain_id, safe);
    UnsignedSafeTransaction { tx, safe_tx_hash }
}

/// Sign a `safeTxHash` as a Safe owner, returning the 65-byte owner signature.
pub fn sign_safe_transaction(
    signer: &PrivateKeySigner,
    safe_tx_hash: &B256,
) -> Result<Bytes, BatchError> {
    let sig = sign_digest(signer, safe_tx_hash)
        .map_err(|e| BatchError::submission(SubmissionStage::Signing, e))?;
    let signature = to_safe_signature(&sig);

    let recovered = recover_signer(safe_tx_hash, &signature)
        .map_err(|e| BatchError::submission(SubmissionStage::Signing, e))?;
    if recovered != signer.address() {
        return Err(BatchError::submission(
            SubmissionStage::Signing,
            format!("signature recovers to {recovered}, expected {}", signer.address()),
        ));
    }
    Ok(signature)
}

/// A signed Safe transaction ready to be proposed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SafeProposal {
    pub safe: Address,
    pub tx: SafeTx,
    pub safe_tx_hash: B256,
    pub sender: Address,
    pub signature: Bytes,
    pub origin: String,
}

/// Request body of `POST /api/v1/safes/{address}/multisig-transactions/`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposeTransactionBody {
    pub to: String,
    pub value: String,
    pub data: String,
    pub operation: u8,
    pub safe_tx_gas: String,
    pub base_gas: String,
    pub gas_price: String,
    pub gas_token: String,
    pub refund_receiver: String,
    pub nonce: String,
    pub contract_transaction_hash: String,
    pub sender: String,
    pub signature: String,
    pub origin: String,
}

impl From<&SafeProposal> for ProposeTransactionBody {
    fn from(proposal: &SafeProposal) -> Self {
        let tx = &proposal.tx;
        Self {
            to: tx.to.to_checksum(None),
            value: tx.value.to_string(),
            data: tx.data.to_string(),
            operation: tx.operation,
            safe_tx_gas: tx.safeTxGas.to_string(),
            base_gas: tx.baseGas.to_string(),
            gas_price: tx.gasPrice.to_string(),
            gas_token: tx.gasToken.to_checksum(None),
            refund_receiver: tx.refundReceiver.to_checksum(None),
            nonce: tx.nonce.to_string(),
            contract_transaction_hash: proposal.safe_tx_hash.to_string(),
            sender: proposal.sender.to_checksum(None),
            signature: proposal.signature.to_string(),
            origin: proposal.origin.clone(),
        }
    }
}

/// A Safe together with the backend that collects its owners' signatures.
#[async_trait]
pub trait MultisigClient: Send + Sync {
    fn safe_address(&self) -> Address;

    /// The nonce the next Safe transaction must use.
    async fn nonce(&self) -> Result<U256, BatchError>;

    async fn propose(&self, proposal: &SafeProposal) -> Result<(), BatchError>;
}

/// Reads the Safe nonce on-chain and proposes to a Safe Transaction Service.
#[derive(Clone, Debug)]
pub struct SafeServiceClient {
    safe: ISafe::ISafeInstance<DynProvider>,
    http: reqwest::Client,
    service_url: Url,
}

impl SafeServiceClient {
    pub fn new(provider: DynProvider, safe: Address, service_url: &str) -> Result<Self, BatchError> {
        let mut service_url = Url::parse(service_url)
            .map_err(|e| BatchError::ClientConfig(format!("invalid Safe service url: {e}")))?;
        if !service_url.path().ends_with('/') {
            let path = format!("{}/", service_url.path());
            service_url.set_path(&path);
        }

        Ok(Self {
            safe: ISafe::new(safe, provider),
            http: reqwest::Client::new(),
            service_url,
        })
    }

    fn proposal_url(&self) -> Result<Url, BatchError> {
        let path = format!(
            "api/v1/safes/{}/multisig-transactions/",
            self.safe.address().to_checksum(None)
        );
        self.service_url
            .join(&path)
            .map_err(|e| BatchError::ClientConfig(e.to_string()))
    }
}

#[async_trait]
impl MultisigClient for SafeServiceClient {
    fn safe_address(&self) -> Address {
        *self.safe.address()
    }

    async fn nonce(&self) -> Result<U256, BatchError> {
        self.safe
            .nonce()
            .call()
            .await
            .map_err(|e| BatchError::submission(SubmissionStage::Creating, e))
    }

    #[tracing::instrument(skip_all, fields(safe_tx_hash = %proposal.safe_tx_hash))]
    async fn propose(&self, proposal: &SafeProposal) -> Result<(), BatchError> {
        let url = self
            .proposal_url()
            .map_err(|e| BatchError::submission(SubmissionStage::Proposing, e))?;
        let response = self
            .http
            .post(url)
            .json(&ProposeTransactionBody::from(proposal))
            .send()
            .await
            .map_err(|e| BatchError::submission(SubmissionStage::Proposing, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BatchError::submission(
                SubmissionStage::Proposing,
                format!("Safe Transaction Service returned {status}: {body}"),
            ));
        }
        tracing::info!("proposed Safe transaction");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use alloy_provider::{Provider, ProviderBuilder};
    use alloy_sol_types::SolCall;
    use eas_batch_solidity_types::eas::{AttestationRequestData, IEAS};

    fn request() -> MultiAttestationRequest {
        MultiAttestationRequest {
            schema: B256::repeat_byte(0x11),
            data: vec![AttestationRequestData::new(
                address!("0x00000000000000000000000000000000000000aa"),
                true,
                B256::ZERO,
                Bytes::from_static(&[1]),
            )],
        }
    }

    #[test]
    fn safe_transaction_calls_multi_attest_on_eas() {
        let eas = address!("0xC2679fBD37d54388Ce493F1DB75320D236e1815e");
        let safe = address!("0x1111111111111111111111111111111111111111");
        let unsigned = prepare_safe_transaction(&request(), eas, U256::from(3), 11_155_111, safe);

        assert_eq!(unsigned.tx.to, eas);
        assert_eq!(unsigned.tx.value, U256::ZERO);
        assert_eq!(unsigned.tx.nonce, U256::from(3));
        let call = IEAS::multiAttestCall::abi_decode(&unsigned.tx.data).unwrap();
        assert_eq!(call.multiRequests, vec![request()]);
        assert_eq!(unsigned.safe_tx_hash, unsigned.tx.safe_tx_hash(11_155_111, safe));
    }

    #[test]
    fn signature_recovers_to_owner() {
        let signer = PrivateKeySigner::random();
        let hash = B256::repeat_byte(0x42);
        let signature = sign_safe_transaction(&signer, &hash).unwrap();
        assert_eq!(signature.len(), 65);
        assert_eq!(recover_signer(&hash, &signature).unwrap(), signer.address());
    }

    #[test]
    fn proposal_body_uses_service_field_names() {
        let signer = PrivateKeySigner::random();
        let safe = address!("0x1111111111111111111111111111111111111111");
        let unsigned = prepare_safe_transaction(
            &request(),
            address!("0x2222222222222222222222222222222222222222"),
            U256::from(9),
            1,
            safe,
        );
        let proposal = SafeProposal {
            safe,
            signature: sign_safe_transaction(&signer, &unsigned.safe_tx_hash).unwrap(),
            tx: unsigned.tx,
            safe_tx_hash: unsigned.safe_tx_hash,
            sender: signer.address(),
            origin: "eas-batch".to_string(),
        };

        let body = serde_json::to_value(ProposeTransactionBody::from(&proposal)).unwrap();
        assert_eq!(body["nonce"], "9");
        assert_eq!(body["operation"], 0);
        assert_eq!(body["safeTxGas"], "0");
        assert_eq!(
            body["refundReceiver"],
            "0x0000000000000000000000000000000000000000"
        );
        assert_eq!(
            body["contractTransactionHash"],
            proposal.safe_tx_hash.to_string()
        );
        assert!(body["data"].as_str().unwrap().starts_with("0x"));
    }

    #[test]
    fn proposal_url_is_joined_under_service_root() {
        let provider = ProviderBuilder::new()
            .connect_http("http://localhost:8545".parse().unwrap())
            .erased();
        let safe = address!("0x1111111111111111111111111111111111111111");
        let client =
            SafeServiceClient::new(provider, safe, "https://safe-transaction-sepolia.safe.global")
                .unwrap();
        assert_eq!(
            client.proposal_url().unwrap().as_str(),
            "https://safe-transaction-sepolia.safe.global/api/v1/safes/0x1111111111111111111111111111111111111111/multisig-transactions/"
        );
    }
}
