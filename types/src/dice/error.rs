use thiserror::Error as ThisError;

use super::{
    ERROR_BET_NOT_FOUND, ERROR_DUPLICATE_BET, ERROR_INSUFFICIENT_BANKROLL,
    ERROR_INSUFFICIENT_FUNDS, ERROR_INVALID_AMOUNT, ERROR_INVALID_ROLL,
    ERROR_MISSING_ATTESTATION, ERROR_OVERFLOW, ERROR_SIGNATURE_MISMATCH,
    ERROR_TIMEOUT_NOT_REACHED, ERROR_UNAUTHORIZED, ERROR_VAULT_EXISTS, ERROR_VAULT_NOT_FOUND,
};

/// Typed rejection of a bet lifecycle transition.
///
/// A rejected transition never leaves partial state behind: funds and records
/// are exactly as they were before the attempt.
#[derive(Debug, ThisError, Clone, PartialEq, Eq)]
pub enum BetError {
    #[error("roll must be within 1..=99 (got {roll})")]
    InvalidRoll { roll: u8 },
    #[error("amount must be greater than zero")]
    InvalidAmount,
    #[error("a bet with seed {seed} is already open against this vault")]
    DuplicateBet { seed: u128 },
    #[error("bankroll cannot cover liability (required={required}, available={available})")]
    InsufficientBankroll { required: u64, available: u64 },
    #[error("account balance too low (required={required}, available={available})")]
    InsufficientFunds { required: u64, available: u64 },
    #[error("resolution carries no attestation")]
    MissingAttestation,
    #[error("attestation does not match the canonical bet message")]
    SignatureMismatch,
    #[error("refund timeout not reached (elapsed={elapsed}, required={required})")]
    TimeoutNotReached { elapsed: u64, required: u64 },
    #[error("bet not found")]
    BetNotFound,
    #[error("vault not found")]
    VaultNotFound,
    #[error("vault already initialized")]
    VaultExists,
    #[error("caller is not authorized for this bet")]
    Unauthorized,
    #[error("arithmetic overflow")]
    Overflow,
}

impl BetError {
    /// Stable code carried in `BetRejected` events.
    pub fn code(&self) -> u8 {
        match self {
            Self::InvalidRoll { .. } => ERROR_INVALID_ROLL,
            Self::InvalidAmount => ERROR_INVALID_AMOUNT,
            Self::DuplicateBet { .. } => ERROR_DUPLICATE_BET,
            Self::InsufficientBankroll { .. } => ERROR_INSUFFICIENT_BANKROLL,
            Self::InsufficientFunds { .. } => ERROR_INSUFFICIENT_FUNDS,
            Self::MissingAttestation => ERROR_MISSING_ATTESTATION,
            Self::SignatureMismatch => ERROR_SIGNATURE_MISMATCH,
            Self::TimeoutNotReached { .. } => ERROR_TIMEOUT_NOT_REACHED,
            Self::BetNotFound => ERROR_BET_NOT_FOUND,
            Self::VaultNotFound => ERROR_VAULT_NOT_FOUND,
            Self::VaultExists => ERROR_VAULT_EXISTS,
            Self::Unauthorized => ERROR_UNAUTHORIZED,
            Self::Overflow => ERROR_OVERFLOW,
        }
    }
}
