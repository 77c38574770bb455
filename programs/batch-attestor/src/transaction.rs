//! Assembly and submission of attestation batches.
//!
//! Two mutually exclusive paths consume the same [`MultiAttestationRequest`]:
//! - [`direct`]: the connected wallet sends `EAS.multiAttest` itself.
//! - [`multisig`]: the call is wrapped in a Safe transaction, signed by one owner
//!   and proposed to the Safe Transaction Service for the other owners.
//!
//! [`MultiAttestationRequest`]: eas_batch_solidity_types::eas::MultiAttestationRequest

pub mod direct;
pub mod multisig;
pub mod state;
