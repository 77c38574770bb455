//! The batch attestation builder: schema loading, batch encoding and submission.

use std::sync::Arc;

use alloy_primitives::{TxHash, B256};
use alloy_signer_local::PrivateKeySigner;
use eas_batch_solidity_types::schema_registry::SchemaRecord;
use tokio::sync::watch;

use crate::{
    analytics::{AnalyticsEvent, AnalyticsSink, SubmissionMode, TracingSink},
    batch::{build_batch, BatchOutcome, DEFAULT_RESOLVE_CONCURRENCY},
    encoder::SchemaEncoder,
    error::BatchError,
    recipient::RecipientResolver,
    registry::SchemaRegistry,
    rows::ParsedRow,
    schema::{resolve_fields, ResolvedSchema},
    transaction::{
        direct::AttestationClient,
        multisig::{prepare_safe_transaction, sign_safe_transaction, MultisigClient, SafeProposal},
        state::{DirectStatus, MultisigStatus, StateTracker, TransactionState},
    },
};

/// Origin reported to the Safe Transaction Service by default.
pub const DEFAULT_PROPOSAL_ORIGIN: &str = "eas-batch";

/// A schema fetched from the registry together with what was derived from it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadedSchema {
    pub uid: B256,
    pub record: SchemaRecord,
    pub resolved: ResolvedSchema,
    /// Kept even when construction failed so the failure can be reported per batch.
    pub encoder: Result<SchemaEncoder, BatchError>,
}

impl LoadedSchema {
    fn new(uid: B256, record: SchemaRecord, ref_uid: bool) -> Self {
        let resolved = resolve_fields(&record.schema, ref_uid);
        let encoder = SchemaEncoder::new(&record.schema);
        if let Err(e) = &encoder {
            tracing::warn!(%uid, "schema cannot be encoded against: {e}");
        }
        Self {
            uid,
            record,
            resolved,
            encoder,
        }
    }
}

/// The result of a successful direct submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttestationReceipt {
    pub tx_hash: TxHash,
    pub uids: Vec<B256>,
}

/// Assembles CSV rows into one `multiAttest` call and submits it, either
/// directly or as a Safe multisig proposal.
///
/// Submissions take `&mut self`, so one builder runs at most one at a time.
pub struct BatchAttestationBuilder {
    chain_id: u64,
    registry: Arc<dyn SchemaRegistry>,
    resolver: Arc<dyn RecipientResolver>,
    attestation: Arc<dyn AttestationClient>,
    multisig: Option<Arc<dyn MultisigClient>>,
    signer: Option<PrivateKeySigner>,
    analytics: Arc<dyn AnalyticsSink>,
    resolve_concurrency: usize,
    origin: String,
    schema: Option<LoadedSchema>,
    state: StateTracker,
}

impl BatchAttestationBuilder {
    #[must_use]
    pub fn new(
        chain_id: u64,
        registry: Arc<dyn SchemaRegistry>,
        resolver: Arc<dyn RecipientResolver>,
        attestation: Arc<dyn AttestationClient>,
    ) -> Self {
        Self {
            chain_id,
            registry,
            resolver,
            attestation,
            multisig: None,
            signer: None,
            analytics: Arc::new(TracingSink),
            resolve_concurrency: DEFAULT_RESOLVE_CONCURRENCY,
            origin: DEFAULT_PROPOSAL_ORIGIN.to_string(),
            schema: None,
            state: StateTracker::default(),
        }
    }

    #[must_use]
    pub fn with_multisig(mut self, multisig: Arc<dyn MultisigClient>) -> Self {
        self.multisig = Some(multisig);
        self
    }

    /// The key that signs Safe transactions as an owner.
    #[must_use]
    pub fn with_signer(mut self, signer: PrivateKeySigner) -> Self {
        self.signer = Some(signer);
        self
    }

    #[must_use]
    pub fn with_analytics(mut self, analytics: Arc<dyn AnalyticsSink>) -> Self {
        self.analytics = analytics;
        self
    }

    #[must_use]
    pub fn with_resolve_concurrency(mut self, concurrency: usize) -> Self {
        self.resolve_concurrency = concurrency.max(1);
        self
    }

    #[must_use]
    pub fn with_proposal_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    #[must_use]
    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// The currently loaded schema, if any.
    #[must_use]
    pub const fn schema(&self) -> Option<&LoadedSchema> {
        self.schema.as_ref()
    }

    #[must_use]
    pub fn state(&self) -> TransactionState {
        self.state.current()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<TransactionState> {
        self.state.subscribe()
    }

    /// Load schema `uid` and resolve its row layout.
    ///
    /// The registry is only queried when `uid` differs from the loaded schema;
    /// switching `ref_uid` on the same schema re-resolves the fields locally.
    #[tracing::instrument(skip(self))]
    pub async fn load_schema(
        &mut self,
        uid: B256,
        ref_uid: bool,
    ) -> Result<&LoadedSchema, BatchError> {
        let cached = matches!(&self.schema, Some(loaded) if loaded.uid == uid);
        if cached {
            if let Some(loaded) = self.schema.as_mut() {
                if loaded.resolved.ref_uid() != ref_uid {
                    loaded.resolved = resolve_fields(&loaded.record.schema, ref_uid);
                }
            }
            return self
                .schema
                .as_ref()
                .ok_or_else(|| BatchError::Precondition("no schema loaded".to_string()));
        }

        let record = self.registry.get_schema(uid).await?;
        let loaded = LoadedSchema::new(uid, record, ref_uid);
        for error in loaded.resolved.errors() {
            tracing::warn!(%uid, "{error}");
        }
        Ok(&*self.schema.insert(loaded))
    }

    fn loaded(&self) -> Result<(&LoadedSchema, &SchemaEncoder), BatchError> {
        let loaded = self
            .schema
            .as_ref()
            .ok_or_else(|| BatchError::Precondition("no schema loaded".to_string()))?;
        let encoder = loaded.encoder.as_ref().map_err(Clone::clone)?;
        Ok((loaded, encoder))
    }

    /// Encode `rows` against the loaded schema, skipping the rows that fail.
    pub async fn encode_rows(&self, rows: &[ParsedRow]) -> Result<BatchOutcome, BatchError> {
        let (loaded, encoder) = self.loaded()?;
        Ok(build_batch(
            rows,
            &loaded.resolved.layout(),
            encoder,
            loaded.record.revocable,
            self.resolver.as_ref(),
            self.resolve_concurrency,
        )
        .await)
    }

    fn check_submittable(&self, outcome: &BatchOutcome) -> Result<B256, BatchError> {
        let (loaded, _) = self.loaded()?;
        if outcome.is_empty() {
            return Err(BatchError::Precondition(
                "batch has no attestations to submit".to_string(),
            ));
        }
        let current = self.state.current();
        if current.is_in_flight() {
            return Err(BatchError::Precondition(format!(
                "a submission is already `{}`; reset first",
                current.tag()
            )));
        }
        Ok(loaded.uid)
    }

    fn emit_submitted(&self, mode: SubmissionMode, schema: B256, count: usize) {
        self.analytics.emit(AnalyticsEvent::batch_submitted(
            self.chain_id,
            mode,
            schema,
            count,
        ));
    }

    /// Send the batch as one `multiAttest` transaction from the connected wallet.
    #[tracing::instrument(skip_all, fields(rows = outcome.len()))]
    pub async fn attest_direct(
        &mut self,
        outcome: &BatchOutcome,
    ) -> Result<AttestationReceipt, BatchError> {
        let schema = self.check_submittable(outcome)?;

        self.state
            .advance(TransactionState::Direct(DirectStatus::Creating))?;
        let request = outcome.multi_request(schema);
        self.emit_submitted(SubmissionMode::Direct, schema, outcome.len());

        self.state
            .advance(TransactionState::Direct(DirectStatus::Attesting))?;
        let pending = self
            .attestation
            .multi_attest(vec![request])
            .await
            .map_err(|e| self.state.fail(e))?;
        let tx_hash = pending.tx_hash;

        self.state
            .advance(TransactionState::Direct(DirectStatus::WaitUid { tx_hash }))?;
        let uids = pending.confirmation.await.map_err(|e| self.state.fail(e))?;

        tracing::info!(%tx_hash, attestations = uids.len(), "batch attested");
        self.state
            .advance(TransactionState::Direct(DirectStatus::Success {
                tx_hash,
                uids: uids.clone(),
            }))?;
        Ok(AttestationReceipt { tx_hash, uids })
    }

    /// Wrap the batch in a Safe transaction, sign it and propose it to the other owners.
    ///
    /// Every precondition is checked before the state changes.
    #[tracing::instrument(skip_all, fields(rows = outcome.len()))]
    pub async fn propose_multisig(
        &mut self,
        outcome: &BatchOutcome,
    ) -> Result<SafeProposal, BatchError> {
        let multisig = self
            .multisig
            .clone()
            .ok_or_else(|| BatchError::Precondition("no Safe configured".to_string()))?;
        let signer = self
            .signer
            .clone()
            .ok_or_else(|| BatchError::Precondition("no signer configured".to_string()))?;
        let schema = self.check_submittable(outcome)?;

        self.state
            .advance(TransactionState::Multisig(MultisigStatus::Creating))?;
        let request = outcome.multi_request(schema);
        self.emit_submitted(SubmissionMode::Multisig, schema, outcome.len());

        let nonce = multisig.nonce().await.map_err(|e| self.state.fail(e))?;
        let safe = multisig.safe_address();
        let unsigned = prepare_safe_transaction(
            &request,
            self.attestation.eas_address(),
            nonce,
            self.chain_id,
            safe,
        );
        let safe_tx_hash = unsigned.safe_tx_hash;
        tracing::debug!(%safe, %nonce, %safe_tx_hash, "built Safe transaction");

        self.state
            .advance(TransactionState::Multisig(MultisigStatus::Signing { safe_tx_hash }))?;
        let signature =
            sign_safe_transaction(&signer, &safe_tx_hash).map_err(|e| self.state.fail(e))?;

        let proposal = SafeProposal {
            safe,
            tx: unsigned.tx,
            safe_tx_hash,
            sender: signer.address(),
            signature: signature.clone(),
            origin: self.origin.clone(),
        };
        multisig
            .propose(&proposal)
            .await
            .map_err(|e| self.state.fail(e))?;

        self.state
            .advance(TransactionState::Multisig(MultisigStatus::Created {
                safe_tx_hash,
                signature,
            }))?;
        Ok(proposal)
    }

    /// Clear the transaction state. The loaded schema is kept.
    pub fn reset(&mut self) {
        self.state.reset();
    }
}
