use bytes::{Buf, BufMut};
use commonware_codec::{Error, FixedSize, Read, ReadExt, Write};
use commonware_cryptography::{
    ed25519::PublicKey,
    sha256::{Digest, Sha256},
    Hasher,
};

use super::{BetError, BET_MESSAGE_LEN, BET_TAG, MAX_ROLL, MIN_ROLL, VAULT_TAG};

/// Address of the vault owned by `house`.
///
/// Any caller can locate a vault from the house identity alone.
pub fn vault_address(house: &PublicKey) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(VAULT_TAG);
    hasher.update(house.as_ref());
    hasher.finalize()
}

/// Address of the bet identified by `(house, seed)`.
pub fn bet_address(house: &PublicKey, seed: u128) -> Digest {
    let vault = vault_address(house);
    let mut hasher = Sha256::new();
    hasher.update(BET_TAG);
    hasher.update(vault.as_ref());
    hasher.update(&seed.to_le_bytes());
    hasher.finalize()
}

/// Disambiguation byte committed into the canonical message.
pub fn bet_bump(house: &PublicKey, seed: u128) -> u8 {
    let address = bet_address(house, seed);
    address.as_ref()[address.as_ref().len() - 1]
}

/// Check the placement invariants shared by every bet.
pub fn validate_wager(roll: u8, amount: u64) -> Result<(), BetError> {
    if !(MIN_ROLL..=MAX_ROLL).contains(&roll) {
        return Err(BetError::InvalidRoll { roll });
    }
    if amount == 0 {
        return Err(BetError::InvalidAmount);
    }
    Ok(())
}

/// One outstanding wager held in escrow by a vault.
///
/// Records are created by placement and destroyed by resolution or refund; they
/// are never mutated in place.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bet {
    pub player: PublicKey,
    pub seed: u128,
    /// Ledger slot at which the bet was placed.
    pub slot: u64,
    pub amount: u64,
    pub roll: u8,
    pub bump: u8,
}

impl Bet {
    pub fn new(
        house: &PublicKey,
        player: PublicKey,
        seed: u128,
        slot: u64,
        amount: u64,
        roll: u8,
    ) -> Result<Self, BetError> {
        validate_wager(roll, amount)?;
        Ok(Self {
            player,
            seed,
            slot,
            amount,
            roll,
            bump: bet_bump(house, seed),
        })
    }

    /// Canonical message the house signs to attest this bet.
    ///
    /// Layout (66 bytes):
    /// `player:32 | seed:u128 LE | slot:u64 LE | amount:u64 LE | roll:u8 | bump:u8`
    ///
    /// Any change to this layout breaks every outstanding attestation.
    pub fn message(&self) -> [u8; BET_MESSAGE_LEN] {
        let mut out = [0u8; BET_MESSAGE_LEN];
        let player = self.player.as_ref();
        out[..32].copy_from_slice(player);
        out[32..48].copy_from_slice(&self.seed.to_le_bytes());
        out[48..56].copy_from_slice(&self.slot.to_le_bytes());
        out[56..64].copy_from_slice(&self.amount.to_le_bytes());
        out[64] = self.roll;
        out[65] = self.bump;
        out
    }

    /// Parse a canonical message back into a bet (used when auditing attestations).
    pub fn from_message(message: &[u8]) -> Result<Self, Error> {
        if message.len() != BET_MESSAGE_LEN {
            return Err(Error::Invalid("Bet", "canonical message must be 66 bytes"));
        }
        let mut reader = &message[..32];
        let player = PublicKey::read(&mut reader)?;
        let le_u64 = |range: std::ops::Range<usize>| {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(&message[range]);
            u64::from_le_bytes(buf)
        };
        let mut seed = [0u8; u128::SIZE];
        seed.copy_from_slice(&message[32..48]);
        let bet = Self {
            player,
            seed: u128::from_le_bytes(seed),
            slot: le_u64(48..56),
            amount: le_u64(56..64),
            roll: message[64],
            bump: message[65],
        };
        validate_wager(bet.roll, bet.amount)
            .map_err(|_| Error::Invalid("Bet", "wager out of range"))?;
        Ok(bet)
    }
}

impl Write for Bet {
    fn write(&self, writer: &mut impl BufMut) {
        self.player.write(writer);
        self.seed.write(writer);
        self.slot.write(writer);
        self.amount.write(writer);
        self.roll.write(writer);
        self.bump.write(writer);
    }
}

impl Read for Bet {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let player = PublicKey::read(reader)?;
        let seed = u128::read(reader)?;
        let slot = u64::read(reader)?;
        let amount = u64::read(reader)?;
        let roll = u8::read(reader)?;
        let bump = u8::read(reader)?;
        validate_wager(roll, amount).map_err(|_| Error::Invalid("Bet", "wager out of range"))?;
        Ok(Self {
            player,
            seed,
            slot,
            amount,
            roll,
            bump,
        })
    }
}

impl FixedSize for Bet {
    const SIZE: usize =
        PublicKey::SIZE + u128::SIZE + u64::SIZE + u64::SIZE + u8::SIZE + u8::SIZE;
}

#[cfg(test)]
mod tests {
    use super::*;
    use commonware_codec::Encode;
    use commonware_cryptography::{ed25519::PrivateKey, Signer};
    use proptest::prelude::*;

    fn keys() -> (PublicKey, PublicKey) {
        (
            PrivateKey::from_seed(1).public_key(),
            PrivateKey::from_seed(2).public_key(),
        )
    }

    #[test]
    fn message_places_fields_at_fixed_offsets() {
        let (house, player) = keys();
        let bet = Bet::new(&house, player.clone(), 1, 77, 100_000_000, 50).unwrap();
        let message = bet.message();

        assert_eq!(message.len(), 66);
        assert_eq!(&message[..32], player.as_ref());
        assert_eq!(&message[32..48], &1u128.to_le_bytes());
        assert_eq!(&message[48..56], &77u64.to_le_bytes());
        assert_eq!(&message[56..64], &100_000_000u64.to_le_bytes());
        assert_eq!(message[64], 50);
        assert_eq!(message[65], bet_bump(&house, 1));
    }

    #[test]
    fn from_message_recovers_bet() {
        let (house, player) = keys();
        let bet = Bet::new(&house, player, u128::MAX - 3, 9, 42, 99).unwrap();
        assert_eq!(Bet::from_message(&bet.message()).unwrap(), bet);
        assert!(Bet::from_message(&bet.message()[..65]).is_err());
    }

    #[test]
    fn new_rejects_out_of_range_wagers() {
        let (house, player) = keys();
        assert_eq!(
            Bet::new(&house, player.clone(), 1, 0, 10, 0),
            Err(BetError::InvalidRoll { roll: 0 })
        );
        assert_eq!(
            Bet::new(&house, player.clone(), 1, 0, 10, 100),
            Err(BetError::InvalidRoll { roll: 100 })
        );
        assert_eq!(
            Bet::new(&house, player, 1, 0, 0, 50),
            Err(BetError::InvalidAmount)
        );
    }

    #[test]
    fn addresses_depend_on_house_and_seed() {
        let (house, other) = keys();
        assert_eq!(vault_address(&house), vault_address(&house));
        assert_ne!(vault_address(&house), vault_address(&other));
        assert_ne!(bet_address(&house, 1), bet_address(&house, 2));
        assert_ne!(bet_address(&house, 1), bet_address(&other, 1));
    }

    #[test]
    fn storage_encoding_is_fixed_size() {
        let (house, player) = keys();
        let bet = Bet::new(&house, player, 5, 6, 7, 8).unwrap();
        let encoded = bet.encode();
        assert_eq!(encoded.len(), Bet::SIZE);
        assert_eq!(Bet::read(&mut &encoded[..]).unwrap(), bet);
    }

    #[test]
    fn storage_decoding_rejects_invalid_roll() {
        let (house, player) = keys();
        let bet = Bet::new(&house, player, 5, 6, 7, 8).unwrap();
        let mut encoded = bet.encode().to_vec();
        let roll_offset = Bet::SIZE - 2;
        encoded[roll_offset] = 0;
        assert!(Bet::read(&mut encoded.as_slice()).is_err());
    }

    proptest! {
        #[test]
        fn message_layout_holds_for_any_wager(
            seed in any::<u128>(),
            slot in any::<u64>(),
            amount in 1u64..,
            roll in 1u8..=99,
        ) {
            let (house, player) = keys();
            let bet = Bet::new(&house, player, seed, slot, amount, roll).unwrap();
            let message = bet.message();
            prop_assert_eq!(message.len(), BET_MESSAGE_LEN);
            prop_assert_eq!(&message[32..48], &seed.to_le_bytes()[..]);
            prop_assert_eq!(&message[48..56], &slot.to_le_bytes()[..]);
            prop_assert_eq!(&message[56..64], &amount.to_le_bytes()[..]);
            prop_assert_eq!(message[64], roll);
        }
    }
}
