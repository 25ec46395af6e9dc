//! Common types used throughout dicehouse.
//!
//! [dice] holds the wagering domain (bets, vaults, the canonical attestation
//! message and rejection reasons). [execution] holds the signed transaction
//! envelope and the keyed state/event encodings consumed by the execution layer.

pub mod dice;
pub mod execution;

pub use dice::{Bet, BetError, Vault};
pub use execution::{
    Account, Event, Instruction, Key, Output, Transaction, Value, MAX_BLOCK_TRANSACTIONS,
    NAMESPACE,
};
