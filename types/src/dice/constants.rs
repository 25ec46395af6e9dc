/// Smallest accepted roll threshold.
pub const MIN_ROLL: u8 = 1;

/// Largest accepted roll threshold.
pub const MAX_ROLL: u8 = 99;

/// Number of faces the resolved roll is reduced onto (`0..ROLL_MODULUS`).
pub const ROLL_MODULUS: u64 = 100;

/// House edge applied to the gross payout of a winning bet (basis points).
pub const HOUSE_EDGE_BPS: u64 = 100;

/// Basis point denominator.
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Slots that must elapse after placement before a player may reclaim a stake.
pub const TIMEOUT_SLOTS: u64 = 1_000;

/// Version of the outcome derivation (SHA-256 over the attestation, first 8
/// bytes little-endian, modulo [ROLL_MODULUS]). Signers and verifiers must agree on it.
pub const OUTCOME_VERSION: u8 = 1;

/// Length of the canonical bet message signed by the house.
pub const BET_MESSAGE_LEN: usize = 66;

/// Length of an Ed25519 attestation.
pub const SIGNATURE_LEN: usize = 64;

/// Domain tags used to derive vault and bet addresses.
pub const VAULT_TAG: &[u8] = b"vault";
pub const BET_TAG: &[u8] = b"bet";

/// Error codes for BetRejected events
pub const ERROR_INVALID_ROLL: u8 = 1;
pub const ERROR_INVALID_AMOUNT: u8 = 2;
pub const ERROR_DUPLICATE_BET: u8 = 3;
pub const ERROR_INSUFFICIENT_BANKROLL: u8 = 4;
pub const ERROR_INSUFFICIENT_FUNDS: u8 = 5;
pub const ERROR_MISSING_ATTESTATION: u8 = 6;
pub const ERROR_SIGNATURE_MISMATCH: u8 = 7;
pub const ERROR_TIMEOUT_NOT_REACHED: u8 = 8;
pub const ERROR_BET_NOT_FOUND: u8 = 9;
pub const ERROR_VAULT_NOT_FOUND: u8 = 10;
pub const ERROR_VAULT_EXISTS: u8 = 11;
pub const ERROR_UNAUTHORIZED: u8 = 12;
pub const ERROR_OVERFLOW: u8 = 13;
