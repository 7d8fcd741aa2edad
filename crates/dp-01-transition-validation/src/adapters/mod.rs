//! # Adapters Layer (Outer Hexagon)
//!
//! Concrete implementations of the outbound ports.
//!
//! - `InMemoryStateRepository`: `StateRepository` over in-process maps
//! - `EcdsaSigner`: `Signer` over secp256k1 (k256)

pub mod ecdsa_signer;
pub mod memory_repository;

pub use ecdsa_signer::EcdsaSigner;
pub use memory_repository::InMemoryStateRepository;
