#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Key handling for Safe owners and direct attesters.

pub mod recover;

#[cfg(feature = "signer")]
pub mod signature;

#[cfg(feature = "signer-local")]
pub mod signer_local;
