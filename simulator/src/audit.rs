use commonware_cryptography::ed25519::PublicKey;
use dicehouse_execution::dice::{resolve, verify_attestation};
use dicehouse_types::{Bet, BetError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("invalid canonical message")]
    Message(#[from] commonware_codec::Error),
    #[error("attestation rejected: {0}")]
    Attestation(#[from] BetError),
}

/// Outcome recomputed from a canonical message and its attestation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditReport {
    pub bet: Bet,
    pub result: u8,
    pub won: bool,
    pub payout: u64,
}

/// Independently check a settled bet: verify the house attestation over the
/// 66-byte canonical message and re-derive the roll and payout from it.
pub fn audit(house: &PublicKey, message: &[u8], signature: &[u8]) -> Result<AuditReport, AuditError> {
    let bet = Bet::from_message(message)?;
    verify_attestation(house, &bet, signature)?;
    let outcome = resolve(&bet, signature)?;
    Ok(AuditReport {
        bet,
        result: outcome.result,
        won: outcome.won,
        payout: outcome.payout,
    })
}
