use commonware_cryptography::ed25519::{PrivateKey, PublicKey};
use dicehouse_types::dice::{Bet, BetError, SIGNATURE_LEN};
use ed25519_consensus::{Signature, SigningKey, VerificationKey};

/// Check that `signature` is the house's Ed25519 signature over the canonical
/// message of `bet`.
///
/// The signature covers the raw 66 bytes with no namespace, so any standard
/// Ed25519 signer holding the house key can produce attestations.
pub fn verify_attestation(house: &PublicKey, bet: &Bet, signature: &[u8]) -> Result<(), BetError> {
    if signature.len() != SIGNATURE_LEN {
        return Err(BetError::MissingAttestation);
    }
    let key = VerificationKey::try_from(house.as_ref()).map_err(|_| BetError::SignatureMismatch)?;
    let signature = Signature::try_from(signature).map_err(|_| BetError::SignatureMismatch)?;
    key.verify(&signature, &bet.message())
        .map_err(|_| BetError::SignatureMismatch)
}

/// Sign the canonical message of `bet` with the house key, as a house signer does.
pub fn sign_attestation(house: &PrivateKey, bet: &Bet) -> Vec<u8> {
    let mut raw = [0u8; 32];
    raw.copy_from_slice(house.as_ref());
    SigningKey::from(raw).sign(&bet.message()).to_bytes().to_vec()
}
