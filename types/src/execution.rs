use bytes::{Buf, BufMut};
use commonware_codec::{Encode, EncodeSize, Error, FixedSize, Read, ReadExt, Write};
use commonware_cryptography::{
    ed25519::{self, PublicKey},
    sha256::{Digest, Sha256},
    Digestible, Hasher, Signer, Verifier,
};
use commonware_utils::union;

use crate::dice::{
    read_bytes, read_string, string_encode_size, write_bytes, write_string, Bet, Vault,
    SIGNATURE_LEN,
};

pub const NAMESPACE: &[u8] = b"_DICEHOUSE";
pub const TRANSACTION_SUFFIX: &[u8] = b"_TX";
pub const MAX_BLOCK_TRANSACTIONS: usize = 500;

/// Maximum length of the human-readable message attached to a rejection.
pub const MAX_REJECTION_MESSAGE_LENGTH: usize = 256;

/// Longest prefix of `message` that fits [MAX_REJECTION_MESSAGE_LENGTH] bytes and
/// ends on a char boundary.
pub fn rejection_message(message: &str) -> &str {
    if message.len() <= MAX_REJECTION_MESSAGE_LENGTH {
        return message;
    }
    let mut end = MAX_REJECTION_MESSAGE_LENGTH;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    &message[..end]
}

#[inline]
pub fn transaction_namespace(namespace: &[u8]) -> Vec<u8> {
    union(namespace, TRANSACTION_SUFFIX)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub nonce: u64,
    pub instruction: Instruction,

    pub public: ed25519::PublicKey,
    pub signature: ed25519::Signature,
}

impl Transaction {
    fn payload(nonce: &u64, instruction: &Instruction) -> Vec<u8> {
        let mut payload = Vec::new();
        nonce.write(&mut payload);
        instruction.write(&mut payload);

        payload
    }

    pub fn sign(private: &ed25519::PrivateKey, nonce: u64, instruction: Instruction) -> Self {
        let signature = private.sign(
            &transaction_namespace(NAMESPACE),
            &Self::payload(&nonce, &instruction),
        );

        Self {
            nonce,
            instruction,
            public: private.public_key(),
            signature,
        }
    }

    pub fn verify(&self) -> bool {
        self.public.verify(
            &transaction_namespace(NAMESPACE),
            &Self::payload(&self.nonce, &self.instruction),
            &self.signature,
        )
    }
}

impl Write for Transaction {
    fn write(&self, writer: &mut impl BufMut) {
        self.nonce.write(writer);
        self.instruction.write(writer);
        self.public.write(writer);
        self.signature.write(writer);
    }
}

impl Read for Transaction {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let nonce = u64::read(reader)?;
        let instruction = Instruction::read(reader)?;
        let public = ed25519::PublicKey::read(reader)?;
        let signature = ed25519::Signature::read(reader)?;

        Ok(Self {
            nonce,
            instruction,
            public,
            signature,
        })
    }
}

impl EncodeSize for Transaction {
    fn encode_size(&self) -> usize {
        self.nonce.encode_size()
            + self.instruction.encode_size()
            + self.public.encode_size()
            + self.signature.encode_size()
    }
}

impl Digestible for Transaction {
    type Digest = Digest;

    fn digest(&self) -> Digest {
        let mut hasher = Sha256::new();
        hasher.update(self.nonce.to_be_bytes().as_ref());
        hasher.update(self.instruction.encode().as_ref());
        hasher.update(self.public.as_ref());
        // We don't include the signature as part of the digest (any valid
        // signature will be valid for the transaction)
        hasher.finalize()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// Credit the signer's account (development faucet).
    /// Binary: [0] [amount:u64 BE]
    Deposit { amount: u64 },

    /// Create the signer's vault and move `initial_funding` into it.
    /// Binary: [1] [initialFunding:u64 BE]
    InitializeVault { initial_funding: u64 },

    /// Escrow `amount` against `house`'s vault.
    /// Binary: [2] [house:32] [seed:u128 BE] [roll:u8] [amount:u64 BE]
    PlaceBet {
        house: PublicKey,
        seed: u128,
        roll: u8,
        amount: u64,
    },

    /// Settle a bet with the house's attestation over its canonical message.
    /// Binary: [3] [house:32] [seed:u128 BE] [sigLen:u32 BE] [sig...]
    ResolveBet {
        house: PublicKey,
        seed: u128,
        signature: Vec<u8>,
    },

    /// Reclaim a stake once the resolution window has elapsed.
    /// Binary: [4] [house:32] [seed:u128 BE]
    RefundBet { house: PublicKey, seed: u128 },
}

impl Write for Instruction {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Deposit { amount } => {
                0u8.write(writer);
                amount.write(writer);
            }
            Self::InitializeVault { initial_funding } => {
                1u8.write(writer);
                initial_funding.write(writer);
            }
            Self::PlaceBet {
                house,
                seed,
                roll,
                amount,
            } => {
                2u8.write(writer);
                house.write(writer);
                seed.write(writer);
                roll.write(writer);
                amount.write(writer);
            }
            Self::ResolveBet {
                house,
                seed,
                signature,
            } => {
                3u8.write(writer);
                house.write(writer);
                seed.write(writer);
                write_bytes(signature, writer);
            }
            Self::RefundBet { house, seed } => {
                4u8.write(writer);
                house.write(writer);
                seed.write(writer);
            }
        }
    }
}

impl Read for Instruction {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let instruction = match u8::read(reader)? {
            0 => Self::Deposit {
                amount: u64::read(reader)?,
            },
            1 => Self::InitializeVault {
                initial_funding: u64::read(reader)?,
            },
            2 => Self::PlaceBet {
                house: PublicKey::read(reader)?,
                seed: u128::read(reader)?,
                roll: u8::read(reader)?,
                amount: u64::read(reader)?,
            },
            3 => Self::ResolveBet {
                house: PublicKey::read(reader)?,
                seed: u128::read(reader)?,
                signature: read_bytes(reader, SIGNATURE_LEN)?,
            },
            4 => Self::RefundBet {
                house: PublicKey::read(reader)?,
                seed: u128::read(reader)?,
            },
            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(instruction)
    }
}

impl EncodeSize for Instruction {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Deposit { .. } => u64::SIZE,
                Self::InitializeVault { .. } => u64::SIZE,
                Self::PlaceBet { .. } => PublicKey::SIZE + u128::SIZE + u8::SIZE + u64::SIZE,
                Self::ResolveBet { signature, .. } => {
                    PublicKey::SIZE + u128::SIZE + 4 + signature.len()
                }
                Self::RefundBet { .. } => PublicKey::SIZE + u128::SIZE,
            }
    }
}

/// Balance and nonce of an account. Used for replay protection and as the
/// source/destination of every stake, payout and refund.
#[derive(Clone, Default, Eq, PartialEq, Debug)]
pub struct Account {
    pub nonce: u64,
    pub balance: u64,
}

impl Write for Account {
    fn write(&self, writer: &mut impl BufMut) {
        self.nonce.write(writer);
        self.balance.write(writer);
    }
}

impl Read for Account {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            nonce: u64::read(reader)?,
            balance: u64::read(reader)?,
        })
    }
}

impl FixedSize for Account {
    const SIZE: usize = u64::SIZE + u64::SIZE;
}

#[derive(Hash, Eq, PartialEq, Ord, PartialOrd, Clone, Debug)]
pub enum Key {
    /// Account for nonce and balance tracking (tag 0)
    Account(PublicKey),

    /// Vault registry entry, one per house (tag 1)
    Vault(PublicKey),

    /// Open bet, unique per (house, seed) (tag 2)
    Bet { house: PublicKey, seed: u128 },

    /// Last executed ledger slot (tag 3)
    Ledger,
}

impl Write for Key {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Account(pk) => {
                0u8.write(writer);
                pk.write(writer);
            }
            Self::Vault(house) => {
                1u8.write(writer);
                house.write(writer);
            }
            Self::Bet { house, seed } => {
                2u8.write(writer);
                house.write(writer);
                seed.write(writer);
            }
            Self::Ledger => 3u8.write(writer),
        }
    }
}

impl Read for Key {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let key = match u8::read(reader)? {
            0 => Self::Account(PublicKey::read(reader)?),
            1 => Self::Vault(PublicKey::read(reader)?),
            2 => Self::Bet {
                house: PublicKey::read(reader)?,
                seed: u128::read(reader)?,
            },
            3 => Self::Ledger,
            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(key)
    }
}

impl EncodeSize for Key {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Account(_) => PublicKey::SIZE,
                Self::Vault(_) => PublicKey::SIZE,
                Self::Bet { .. } => PublicKey::SIZE + u128::SIZE,
                Self::Ledger => 0,
            }
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Value {
    Account(Account),
    Vault(Vault),
    Bet(Bet),
    Ledger { slot: u64 },
}

impl Write for Value {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Account(account) => {
                0u8.write(writer);
                account.write(writer);
            }
            Self::Vault(vault) => {
                1u8.write(writer);
                vault.write(writer);
            }
            Self::Bet(bet) => {
                2u8.write(writer);
                bet.write(writer);
            }
            Self::Ledger { slot } => {
                3u8.write(writer);
                slot.write(writer);
            }
        }
    }
}

impl Read for Value {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = match u8::read(reader)? {
            0 => Self::Account(Account::read(reader)?),
            1 => Self::Vault(Vault::read(reader)?),
            2 => Self::Bet(Bet::read(reader)?),
            3 => Self::Ledger {
                slot: u64::read(reader)?,
            },
            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(value)
    }
}

impl EncodeSize for Value {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Account(_) => Account::SIZE,
                Self::Vault(_) => Vault::SIZE,
                Self::Bet(_) => Bet::SIZE,
                Self::Ledger { .. } => u64::SIZE,
            }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Deposited {
        player: PublicKey,
        amount: u64,
        balance: u64,
    },
    VaultInitialized {
        house: PublicKey,
        vault: Digest,
        balance: u64,
    },
    BetPlaced {
        house: PublicKey,
        bet: Bet,
    },
    BetResolved {
        house: PublicKey,
        seed: u128,
        player: PublicKey,
        roll: u8,
        result: u8,
        won: bool,
        payout: u64,
    },
    BetRefunded {
        house: PublicKey,
        seed: u128,
        player: PublicKey,
        amount: u64,
    },
    BetRejected {
        public: PublicKey,
        error_code: u8,
        message: String,
    },
}

impl Write for Event {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Deposited {
                player,
                amount,
                balance,
            } => {
                0u8.write(writer);
                player.write(writer);
                amount.write(writer);
                balance.write(writer);
            }
            Self::VaultInitialized {
                house,
                vault,
                balance,
            } => {
                1u8.write(writer);
                house.write(writer);
                vault.write(writer);
                balance.write(writer);
            }
            Self::BetPlaced { house, bet } => {
                2u8.write(writer);
                house.write(writer);
                bet.write(writer);
            }
            Self::BetResolved {
                house,
                seed,
                player,
                roll,
                result,
                won,
                payout,
            } => {
                3u8.write(writer);
                house.write(writer);
                seed.write(writer);
                player.write(writer);
                roll.write(writer);
                result.write(writer);
                won.write(writer);
                payout.write(writer);
            }
            Self::BetRefunded {
                house,
                seed,
                player,
                amount,
            } => {
                4u8.write(writer);
                house.write(writer);
                seed.write(writer);
                player.write(writer);
                amount.write(writer);
            }
            Self::BetRejected {
                public,
                error_code,
                message,
            } => {
                5u8.write(writer);
                public.write(writer);
                error_code.write(writer);
                write_string(rejection_message(message), writer);
            }
        }
    }
}

impl Read for Event {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let event = match u8::read(reader)? {
            0 => Self::Deposited {
                player: PublicKey::read(reader)?,
                amount: u64::read(reader)?,
                balance: u64::read(reader)?,
            },
            1 => Self::VaultInitialized {
                house: PublicKey::read(reader)?,
                vault: Digest::read(reader)?,
                balance: u64::read(reader)?,
            },
            2 => Self::BetPlaced {
                house: PublicKey::read(reader)?,
                bet: Bet::read(reader)?,
            },
            3 => Self::BetResolved {
                house: PublicKey::read(reader)?,
                seed: u128::read(reader)?,
                player: PublicKey::read(reader)?,
                roll: u8::read(reader)?,
                result: u8::read(reader)?,
                won: bool::read(reader)?,
                payout: u64::read(reader)?,
            },
            4 => Self::BetRefunded {
                house: PublicKey::read(reader)?,
                seed: u128::read(reader)?,
                player: PublicKey::read(reader)?,
                amount: u64::read(reader)?,
            },
            5 => Self::BetRejected {
                public: PublicKey::read(reader)?,
                error_code: u8::read(reader)?,
                message: read_string(reader, MAX_REJECTION_MESSAGE_LENGTH)?,
            },
            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(event)
    }
}

impl EncodeSize for Event {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Deposited { .. } => PublicKey::SIZE + u64::SIZE + u64::SIZE,
                Self::VaultInitialized { .. } => PublicKey::SIZE + Digest::SIZE + u64::SIZE,
                Self::BetPlaced { .. } => PublicKey::SIZE + Bet::SIZE,
                Self::BetResolved { .. } => {
                    PublicKey::SIZE
                        + u128::SIZE
                        + PublicKey::SIZE
                        + u8::SIZE
                        + u8::SIZE
                        + bool::SIZE
                        + u64::SIZE
                }
                Self::BetRefunded { .. } => {
                    PublicKey::SIZE + u128::SIZE + PublicKey::SIZE + u64::SIZE
                }
                Self::BetRejected { message, .. } => {
                    PublicKey::SIZE + u8::SIZE + string_encode_size(rejection_message(message))
                }
            }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Event(Event),
    Transaction(Transaction),
    Commit { slot: u64 },
}

impl Write for Output {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Event(event) => {
                0u8.write(writer);
                event.write(writer);
            }
            Self::Transaction(transaction) => {
                1u8.write(writer);
                transaction.write(writer);
            }
            Self::Commit { slot } => {
                2u8.write(writer);
                slot.write(writer);
            }
        }
    }
}

impl Read for Output {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let kind = u8::read(reader)?;
        match kind {
            0 => Ok(Self::Event(Event::read(reader)?)),
            1 => Ok(Self::Transaction(Transaction::read(reader)?)),
            2 => Ok(Self::Commit {
                slot: u64::read(reader)?,
            }),
            _ => Err(Error::InvalidEnum(kind)),
        }
    }
}

impl EncodeSize for Output {
    fn encode_size(&self) -> usize {
        1 + match self {
            Self::Event(event) => event.encode_size(),
            Self::Transaction(transaction) => transaction.encode_size(),
            Self::Commit { slot } => slot.encode_size(),
        }
    }
}
