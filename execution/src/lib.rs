//! Dicehouse execution layer.
//!
//! This crate contains the deterministic transaction execution logic ([`Layer`]) and the
//! dice settlement rules (attestation checks, outcome derivation, bankroll accounting)
//! used by the simulator.
//!
//! ## Determinism requirements
//! - Do not use wall-clock time inside execution; the ledger slot is the only clock.
//! - Outcomes derive only from the house attestation over the canonical bet message.
//! - Avoid iteration order of hash-based collections influencing outputs.
//!
//! The primary entrypoint is [`state_transition::execute_state_transition`].

pub mod dice;
pub mod state_transition;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

mod layer;

mod state;

pub use layer::{Layer, TransitionError};
pub use state::{
    ledger_slot, load_account, load_bet, load_vault, nonce, Memory, PrepareError, State, Status,
};
