use alloy_primitives::{Address, Signature, B256};

/// Recover the signer of an EIP-712 digest from a 65-byte `r || s || v` signature.
pub fn recover_signer(digest: &B256, signature_65: &[u8]) -> Result<Address, anyhow::Error> {
    let sig = Signature::try_from(signature_65)
        .map_err(|_| anyhow::anyhow!("invalid signature length/format"))?;
    sig.recover_address_from_prehash(digest)
        .map_err(|_| anyhow::anyhow!("signature recovery failed"))
}
