//! Dice settlement primitives: attestation checks, outcome derivation and
//! bankroll accounting. The lifecycle handlers in the layer compose these.

pub mod attestation;
pub mod bankroll;
pub mod outcome;

pub use attestation::{sign_attestation, verify_attestation};
pub use outcome::{max_liability, payout_if_win, resolve, roll_from_signature, Outcome};
