//! Solidity types for the EAS batch attestor.
//!
//! Bindings for the Ethereum Attestation Service, its schema registry, the Safe
//! multisig wallet and the ENS registry.

pub mod eas;
pub mod ens;
pub mod safe;
pub mod schema_registry;
