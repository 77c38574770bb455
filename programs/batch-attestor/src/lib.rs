//! Batch attestations on the Ethereum Attestation Service.
//!
//! CSV rows are encoded against a registered EAS schema and submitted as a
//! single `multiAttest` call, either from the connected wallet or as a Safe
//! multisig proposal.

pub mod analytics;
pub mod batch;
pub mod builder;
pub mod cli;
pub mod clients;
pub mod encoder;
pub mod error;
pub mod layout;
pub mod observability;
pub mod recipient;
pub mod registry;
pub mod rows;
pub mod schema;
pub mod signer;
pub mod transaction;

pub use builder::{AttestationReceipt, BatchAttestationBuilder, LoadedSchema};
pub use error::{BatchError, SubmissionStage};
