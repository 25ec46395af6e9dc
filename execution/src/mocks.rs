use crate::dice::sign_attestation;
use commonware_cryptography::{
    ed25519::{PrivateKey, PublicKey},
    Signer,
};
use dicehouse_types::{
    execution::{Instruction, Transaction},
    Bet,
};

/// Creates an account keypair for Ed25519 signatures used by players and houses
pub fn create_account_keypair(seed: u64) -> (PrivateKey, PublicKey) {
    let private = PrivateKey::from_seed(seed);
    let public = private.public_key();
    (private, public)
}

/// Signs the canonical message of `bet` the way a house signer does (no namespace).
pub fn sign_bet(house: &PrivateKey, bet: &Bet) -> Vec<u8> {
    sign_attestation(house, bet)
}

/// Builds a `ResolveBet` transaction carrying the house attestation for `bet`.
pub fn create_resolve(
    caller: &PrivateKey,
    nonce: u64,
    house: &PrivateKey,
    bet: &Bet,
) -> Transaction {
    Transaction::sign(
        caller,
        nonce,
        Instruction::ResolveBet {
            house: house.public_key(),
            seed: bet.seed,
            signature: sign_bet(house, bet),
        },
    )
}
