//! # Ports Layer (Middle Hexagon)
//!
//! - **Driving Ports (Inbound)**: `StateTransitionValidationApi`
//! - **Driven Ports (Outbound)**: `StateRepository`, `Signer`
//! - No concrete implementations in this module

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
