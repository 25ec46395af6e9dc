use bytes::{Buf, BufMut};
use commonware_codec::{Error, FixedSize, Read, ReadExt, Write};
use commonware_cryptography::{ed25519::PublicKey, sha256::Digest};

use super::vault_address;

/// Pooled bankroll controlled by a single house.
///
/// `balance` includes every stake currently held in escrow. `exposure` is the
/// sum of the worst-case liabilities of the open bets and never exceeds `balance`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Vault {
    pub house: PublicKey,
    pub balance: u64,
    pub exposure: u64,
    pub open_bets: u64,
}

impl Vault {
    pub fn new(house: PublicKey) -> Self {
        Self {
            house,
            balance: 0,
            exposure: 0,
            open_bets: 0,
        }
    }

    pub fn address(&self) -> Digest {
        vault_address(&self.house)
    }

    /// Funds not committed to any open bet.
    pub fn free_balance(&self) -> u64 {
        self.balance.saturating_sub(self.exposure)
    }
}

impl Write for Vault {
    fn write(&self, writer: &mut impl BufMut) {
        self.house.write(writer);
        self.balance.write(writer);
        self.exposure.write(writer);
        self.open_bets.write(writer);
    }
}

impl Read for Vault {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let house = PublicKey::read(reader)?;
        let balance = u64::read(reader)?;
        let exposure = u64::read(reader)?;
        let open_bets = u64::read(reader)?;
        if exposure > balance {
            return Err(Error::Invalid("Vault", "exposure exceeds balance"));
        }
        Ok(Self {
            house,
            balance,
            exposure,
            open_bets,
        })
    }
}

impl FixedSize for Vault {
    const SIZE: usize = PublicKey::SIZE + u64::SIZE + u64::SIZE + u64::SIZE;
}

#[cfg(test)]
mod tests {
    use super::*;
    use commonware_codec::Encode;
    use commonware_cryptography::{ed25519::PrivateKey, Signer};

    #[test]
    fn free_balance_excludes_exposure() {
        let mut vault = Vault::new(PrivateKey::from_seed(1).public_key());
        vault.balance = 1_000;
        vault.exposure = 400;
        assert_eq!(vault.free_balance(), 600);
    }

    #[test]
    fn decoding_rejects_overexposed_vault() {
        let mut vault = Vault::new(PrivateKey::from_seed(1).public_key());
        vault.balance = 10;
        vault.exposure = 11;
        let encoded = vault.encode();
        assert!(Vault::read(&mut &encoded[..]).is_err());
    }
}
