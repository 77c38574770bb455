use alloy_primitives::{Bytes, Signature, B256};
use alloy_signer::SignerSync;

/// Sign an already hashed EIP-712 digest, such as a `safeTxHash`.
pub fn sign_digest<T: SignerSync>(signer: &T, digest: &B256) -> Result<Signature, anyhow::Error> {
    signer
        .sign_hash_sync(digest)
        .map_err(|e| anyhow::anyhow!("{e}"))
}

/// Encode a signature the way the Safe contracts expect an EOA owner signature:
/// 65 bytes `r || s || v` with `v` in `{27, 28}`.
#[must_use]
pub fn to_safe_signature(sig: &Signature) -> Bytes {
    Bytes::from(sig.as_bytes().to_vec())
}
