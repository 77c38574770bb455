//! Wiring of the on-chain and HTTP clients from configuration.

use std::sync::Arc;

use alloy_network::EthereumWallet;
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_signer_local::PrivateKeySigner;

use crate::{
    analytics::{AnalyticsSink, HttpSink, TracingSink},
    builder::BatchAttestationBuilder,
    cli::BatchAttestorConfig,
    error::BatchError,
    recipient::{EnsResolver, LiteralResolver, RecipientResolver},
    registry::RegistryClient,
    transaction::{direct::EasClient, multisig::SafeServiceClient},
};

/// Connect to the configured RPC endpoint, signing with `signer` when given.
#[must_use]
pub fn connect(config: &BatchAttestorConfig, signer: Option<&PrivateKeySigner>) -> DynProvider {
    let url = config.network.rpc_url.clone();
    match signer {
        Some(signer) => ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer.clone()))
            .connect_http(url)
            .erased(),
        None => ProviderBuilder::new().connect_http(url).erased(),
    }
}

fn recipient_resolver(
    config: &BatchAttestorConfig,
    provider: &DynProvider,
) -> Arc<dyn RecipientResolver> {
    if config.network.resolve_ens {
        Arc::new(EnsResolver::new(
            provider.clone(),
            config.network.ens_registry_address,
        ))
    } else {
        Arc::new(LiteralResolver)
    }
}

fn analytics_sink(config: &BatchAttestorConfig) -> Arc<dyn AnalyticsSink> {
    match &config.analytics {
        Some(analytics) => Arc::new(HttpSink::new(analytics.endpoint.clone())),
        None => Arc::new(TracingSink),
    }
}

/// Build a [`BatchAttestationBuilder`] backed by the configured network.
///
/// Without a signer the builder can load schemas and encode batches but every
/// submission fails when the transaction is sent.
pub async fn build_batch_attestor(
    config: &BatchAttestorConfig,
    signer: Option<PrivateKeySigner>,
) -> Result<BatchAttestationBuilder, BatchError> {
    let provider = connect(config, signer.as_ref());

    let chain_id = provider
        .get_chain_id()
        .await
        .map_err(|e| BatchError::ClientConfig(format!("unable to reach RPC: {e}")))?;
    if chain_id != config.network.chain_id {
        return Err(BatchError::ClientConfig(format!(
            "RPC serves chain {chain_id} but chain {} is configured",
            config.network.chain_id
        )));
    }

    let mut builder = BatchAttestationBuilder::new(
        chain_id,
        Arc::new(RegistryClient::new(
            provider.clone(),
            config.network.schema_registry_address,
        )),
        recipient_resolver(config, &provider),
        Arc::new(EasClient::new(provider.clone(), config.network.eas_address)),
    )
    .with_analytics(analytics_sink(config))
    .with_resolve_concurrency(config.batch.resolve_concurrency);

    if let Some(safe) = &config.safe {
        let client = SafeServiceClient::new(provider, safe.address, safe.service_url.as_str())?;
        builder = builder
            .with_multisig(Arc::new(client))
            .with_proposal_origin(safe.origin.clone());
    }
    if let Some(signer) = signer {
        builder = builder.with_signer(signer);
    }
    Ok(builder)
}
