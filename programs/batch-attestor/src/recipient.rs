//! Resolution of the recipient column to a canonical address.

use alloy_primitives::Address;
use alloy_provider::DynProvider;
use async_trait::async_trait;
use eas_batch_solidity_types::ens::{namehash, IAddrResolver, IENSRegistry};

use crate::error::BatchError;

/// Resolves a recipient identifier, either a literal address or a name, to an address.
#[async_trait]
pub trait RecipientResolver: Send + Sync {
    async fn resolve(&self, identifier: &str) -> Result<Address, BatchError>;
}

fn unresolved(identifier: &str, reason: impl Into<String>) -> BatchError {
    BatchError::RecipientResolution {
        identifier: identifier.to_string(),
        reason: reason.into(),
    }
}

/// Parse a `0x` prefixed address literal.
///
/// Returns `None` when `identifier` is not an address literal at all. Mixed-case
/// literals must carry a valid EIP-55 checksum.
pub fn parse_address_literal(identifier: &str) -> Option<Result<Address, BatchError>> {
    let digits = identifier
        .strip_prefix("0x")
        .or_else(|| identifier.strip_prefix("0X"))?;

    let parsed = if digits.len() != 40 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        Err(unresolved(identifier, "not a 20 byte hex address"))
    } else if digits.bytes().any(|b| b.is_ascii_lowercase())
        && digits.bytes().any(|b| b.is_ascii_uppercase())
    {
        Address::parse_checksummed(format!("0x{digits}"), None)
            .map_err(|_| unresolved(identifier, "invalid EIP-55 checksum"))
    } else {
        digits
            .parse::<Address>()
            .map_err(|e| unresolved(identifier, e.to_string()))
    };
    Some(parsed)
}

/// Accepts address literals only.
#[derive(Clone, Copy, Debug, Default)]
pub struct LiteralResolver;

#[async_trait]
impl RecipientResolver for LiteralResolver {
    async fn resolve(&self, identifier: &str) -> Result<Address, BatchError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(unresolved(identifier, "empty recipient"));
        }
        parse_address_literal(identifier)
            .unwrap_or_else(|| Err(unresolved(identifier, "not an address literal")))
    }
}

/// Resolves address literals locally and ENS names through the ENS registry.
#[derive(Clone, Debug)]
pub struct EnsResolver {
    provider: DynProvider,
    registry: IENSRegistry::IENSRegistryInstance<DynProvider>,
}

impl EnsResolver {
    #[must_use]
    pub fn new(provider: DynProvider, registry: Address) -> Self {
        Self {
            registry: IENSRegistry::new(registry, provider.clone()),
            provider,
        }
    }

    async fn resolve_name(&self, name: &str) -> Result<Address, BatchError> {
        let node = namehash(name);
        let resolver = self
            .registry
            .resolver(node)
            .call()
            .await
            .map_err(|e| unresolved(name, e.to_string()))?;
        if resolver.is_zero() {
            return Err(unresolved(name, "no resolver set"));
        }

        let address = IAddrResolver::new(resolver, self.provider.clone())
            .addr(node)
            .call()
            .await
            .map_err(|e| unresolved(name, e.to_string()))?;
        if address.is_zero() {
            return Err(unresolved(name, "name has no address record"));
        }

        tracing::debug!(name, %address, "resolved ENS name");
        Ok(address)
    }
}

#[async_trait]
impl RecipientResolver for EnsResolver {
    async fn resolve(&self, identifier: &str) -> Result<Address, BatchError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(unresolved(identifier, "empty recipient"));
        }
        if let Some(parsed) = parse_address_literal(identifier) {
            return parsed;
        }
        if !identifier.contains('.') {
            return Err(unresolved(identifier, "not an address or ENS name"));
        }
        self.resolve_name(identifier).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn accepts_lowercase_uppercase_and_checksummed_literals() {
        let expected = address!("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
        for literal in [
            "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed",
            "0x5AAEB6053F3E94C9B9A09F33669435E7EF1BEAED",
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
        ] {
            assert_eq!(parse_address_literal(literal).unwrap().unwrap(), expected);
        }
    }

    #[test]
    fn rejects_bad_checksum_and_short_literals() {
        assert!(parse_address_literal("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAeD")
            .unwrap()
            .is_err());
        assert!(parse_address_literal("0xABC123").unwrap().is_err());
        assert!(parse_address_literal("vitalik.eth").is_none());
    }

    #[tokio::test]
    async fn literal_resolver_rejects_names_and_empty_cells() {
        let resolver = LiteralResolver;
        assert!(matches!(
            resolver.resolve("").await,
            Err(BatchError::RecipientResolution { .. })
        ));
        assert!(resolver.resolve("vitalik.eth").await.is_err());
        assert_eq!(
            resolver
                .resolve(" 0x00000000000000000000000000000000000000aa ")
                .await
                .unwrap(),
            address!("0x00000000000000000000000000000000000000aa")
        );
    }
}
