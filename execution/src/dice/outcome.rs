use commonware_cryptography::{sha256::Sha256, Hasher};
use dicehouse_types::dice::{
    Bet, BetError, BPS_DENOMINATOR, HOUSE_EDGE_BPS, MAX_ROLL, MIN_ROLL, ROLL_MODULUS,
};

/// Settlement of a single bet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Outcome {
    /// Derived roll in `0..ROLL_MODULUS`.
    pub result: u8,
    pub won: bool,
    /// Amount paid from the vault to the player (zero on a loss).
    pub payout: u64,
}

/// Derive the roll from the attestation bytes.
///
/// SHA-256 over the signature, first 8 bytes read little-endian, reduced modulo
/// [ROLL_MODULUS]. The bet seed is never an input.
pub fn roll_from_signature(signature: &[u8]) -> u8 {
    let digest = Sha256::hash(signature);
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest.as_ref()[..8]);
    (u64::from_le_bytes(head) % ROLL_MODULUS) as u8
}

/// Payout for a winning bet: `amount * 100 / roll` less the house edge,
/// truncating at each step.
pub fn payout_if_win(amount: u64, roll: u8) -> Result<u64, BetError> {
    if !(MIN_ROLL..=MAX_ROLL).contains(&roll) {
        return Err(BetError::InvalidRoll { roll });
    }
    let gross = (amount as u128) * (ROLL_MODULUS as u128) / (roll as u128);
    let edge = gross * (HOUSE_EDGE_BPS as u128) / (BPS_DENOMINATOR as u128);
    u64::try_from(gross - edge).map_err(|_| BetError::Overflow)
}

/// Worst-case amount the vault may owe on a bet: the winning payout, or the
/// stake itself when refunded.
pub fn max_liability(amount: u64, roll: u8) -> Result<u64, BetError> {
    Ok(payout_if_win(amount, roll)?.max(amount))
}

/// Resolve `bet` against a verified attestation.
pub fn resolve(bet: &Bet, signature: &[u8]) -> Result<Outcome, BetError> {
    let result = roll_from_signature(signature);
    let won = result < bet.roll;
    let payout = if won {
        payout_if_win(bet.amount, bet.roll)?
    } else {
        0
    };
    Ok(Outcome {
        result,
        won,
        payout,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::create_account_keypair;
    use proptest::prelude::*;

    #[test]
    fn test_payout_at_even_odds() {
        assert_eq!(payout_if_win(100_000_000, 50), Ok(198_000_000));
    }

    #[test]
    fn test_payout_truncates() {
        // gross = 100 * 100 / 99 = 101, edge = 101 * 100 / 10_000 = 1
        assert_eq!(payout_if_win(100, 99), Ok(100));
        // gross = 7 * 100 / 3 = 233, edge = 2
        assert_eq!(payout_if_win(7, 3), Ok(231));
        assert_eq!(payout_if_win(1, 99), Ok(1));
    }

    #[test]
    fn test_payout_overflow() {
        assert_eq!(payout_if_win(u64::MAX, 1), Err(BetError::Overflow));
        assert_eq!(payout_if_win(u64::MAX, 0), Err(BetError::InvalidRoll { roll: 0 }));
    }

    #[test]
    fn test_liability_covers_refund() {
        assert_eq!(max_liability(100, 99), Ok(100));
        assert_eq!(max_liability(10_000, 99), Ok(10_000));
        assert_eq!(max_liability(100_000_000, 50), Ok(198_000_000));
    }

    #[test]
    fn test_roll_is_deterministic() {
        let signature = [7u8; 64];
        let digest = Sha256::hash(&signature);
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest.as_ref()[..8]);
        let expected = (u64::from_le_bytes(head) % 100) as u8;
        assert_eq!(roll_from_signature(&signature), expected);
        assert_eq!(roll_from_signature(&signature), roll_from_signature(&signature));
    }

    #[test]
    fn test_resolve_uses_win_rule() {
        let (_, house) = create_account_keypair(1);
        let (_, player) = create_account_keypair(2);
        let signature = [3u8; 64];
        let result = roll_from_signature(&signature);

        // Threshold just above the result wins, threshold equal to it loses.
        if result < MAX_ROLL {
            let winning = Bet::new(&house, player.clone(), 1, 0, 1_000, result + 1).unwrap();
            let outcome = resolve(&winning, &signature).unwrap();
            assert!(outcome.won);
            assert_eq!(outcome.payout, payout_if_win(1_000, result + 1).unwrap());
        }
        if result >= MIN_ROLL {
            let losing = Bet::new(&house, player, 1, 0, 1_000, result).unwrap();
            let outcome = resolve(&losing, &signature).unwrap();
            assert!(!outcome.won);
            assert_eq!(outcome.payout, 0);
        }
    }

    proptest! {
        #[test]
        fn roll_stays_in_range(signature in proptest::collection::vec(any::<u8>(), 64)) {
            prop_assert!((roll_from_signature(&signature) as u64) < ROLL_MODULUS);
        }

        #[test]
        fn payout_never_exceeds_gross(amount in 1u64..=u64::MAX / 100, roll in 1u8..=99) {
            let payout = payout_if_win(amount, roll).unwrap() as u128;
            let gross = amount as u128 * 100 / roll as u128;
            prop_assert!(payout <= gross);
            prop_assert!(max_liability(amount, roll).unwrap() >= amount);
        }
    }
}
