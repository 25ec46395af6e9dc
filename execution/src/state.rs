use anyhow::Result;
use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, Write};
use commonware_cryptography::ed25519::PublicKey;
use dicehouse_types::{
    execution::{Account, Key, Value},
    Bet, Vault,
};
use std::{collections::HashMap, future::Future};

#[derive(Debug)]
pub enum PrepareError {
    NonceMismatch { expected: u64, got: u64 },
    State(anyhow::Error),
}

pub trait State {
    fn get(&self, key: &Key) -> impl Future<Output = Result<Option<Value>>>;
    fn insert(&mut self, key: Key, value: Value) -> impl Future<Output = Result<()>>;
    fn delete(&mut self, key: &Key) -> impl Future<Output = Result<()>>;

    fn apply(&mut self, changes: Vec<(Key, Status)>) -> impl Future<Output = Result<()>> {
        async {
            for (key, status) in changes {
                match status {
                    Status::Update(value) => self.insert(key, value).await?,
                    Status::Delete => self.delete(&key).await?,
                }
            }
            Ok(())
        }
    }
}

/// In-process keyed registry of accounts, vaults and open bets.
#[derive(Default)]
pub struct Memory {
    state: HashMap<Key, Value>,
}

impl Memory {
    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }
}

impl State for Memory {
    async fn get(&self, key: &Key) -> Result<Option<Value>> {
        Ok(self.state.get(key).cloned())
    }

    async fn insert(&mut self, key: Key, value: Value) -> Result<()> {
        self.state.insert(key, value);
        Ok(())
    }

    async fn delete(&mut self, key: &Key) -> Result<()> {
        self.state.remove(key);
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(clippy::large_enum_variant)]
pub enum Status {
    Update(Value),
    Delete,
}

impl Write for Status {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Status::Update(value) => {
                0u8.write(writer);
                value.write(writer);
            }
            Status::Delete => 1u8.write(writer),
        }
    }
}

impl Read for Status {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let kind = u8::read(reader)?;
        match kind {
            0 => Ok(Status::Update(Value::read(reader)?)),
            1 => Ok(Status::Delete),
            _ => Err(Error::InvalidEnum(kind)),
        }
    }
}

impl EncodeSize for Status {
    fn encode_size(&self) -> usize {
        1 + match self {
            Status::Update(value) => value.encode_size(),
            Status::Delete => 0,
        }
    }
}

pub async fn nonce<S: State>(state: &S, public: &PublicKey) -> Result<u64> {
    Ok(load_account(state, public).await?.nonce)
}

pub async fn load_account<S: State>(state: &S, public: &PublicKey) -> Result<Account> {
    Ok(match state.get(&Key::Account(public.clone())).await? {
        Some(Value::Account(account)) => account,
        _ => Account::default(),
    })
}

pub async fn load_vault<S: State>(state: &S, house: &PublicKey) -> Result<Option<Vault>> {
    Ok(match state.get(&Key::Vault(house.clone())).await? {
        Some(Value::Vault(vault)) => Some(vault),
        _ => None,
    })
}

pub async fn load_bet<S: State>(state: &S, house: &PublicKey, seed: u128) -> Result<Option<Bet>> {
    let key = Key::Bet {
        house: house.clone(),
        seed,
    };
    Ok(match state.get(&key).await? {
        Some(Value::Bet(bet)) => Some(bet),
        _ => None,
    })
}

/// Last slot committed by the state transition, if any block has been executed.
pub async fn ledger_slot<S: State>(state: &S) -> Result<Option<u64>> {
    Ok(match state.get(&Key::Ledger).await? {
        Some(Value::Ledger { slot }) => Some(slot),
        _ => None,
    })
}

pub(crate) fn validate_and_increment_nonce(
    account: &mut Account,
    provided_nonce: u64,
) -> Result<(), PrepareError> {
    if account.nonce != provided_nonce {
        return Err(PrepareError::NonceMismatch {
            expected: account.nonce,
            got: provided_nonce,
        });
    }
    account.nonce += 1;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::create_account_keypair;
    use commonware_codec::Encode;
    use commonware_runtime::deterministic::Runner;
    use commonware_runtime::Runner as _;

    #[test]
    fn test_validate_and_increment_nonce() {
        let mut account = Account::default();
        assert!(matches!(
            validate_and_increment_nonce(&mut account, 1),
            Err(PrepareError::NonceMismatch {
                expected: 0,
                got: 1
            })
        ));
        assert_eq!(account.nonce, 0);
        validate_and_increment_nonce(&mut account, 0).unwrap();
        assert_eq!(account.nonce, 1);
    }

    #[test]
    fn test_memory_apply() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let mut state = Memory::default();
            let (_, house) = create_account_keypair(1);
            let (_, player) = create_account_keypair(2);

            state
                .apply(vec![
                    (
                        Key::Account(player.clone()),
                        Status::Update(Value::Account(Account {
                            nonce: 3,
                            balance: 10,
                        })),
                    ),
                    (
                        Key::Vault(house.clone()),
                        Status::Update(Value::Vault(Vault::new(house.clone()))),
                    ),
                    (Key::Ledger, Status::Update(Value::Ledger { slot: 7 })),
                ])
                .await
                .unwrap();
            assert_eq!(state.len(), 3);
            assert_eq!(nonce(&state, &player).await.unwrap(), 3);
            assert!(load_vault(&state, &house).await.unwrap().is_some());
            assert_eq!(ledger_slot(&state).await.unwrap(), Some(7));

            state
                .apply(vec![(Key::Vault(house.clone()), Status::Delete)])
                .await
                .unwrap();
            assert!(load_vault(&state, &house).await.unwrap().is_none());
            assert!(load_bet(&state, &house, 1).await.unwrap().is_none());
        });
    }

    #[test]
    fn test_status_encoding() {
        let status = Status::Update(Value::Ledger { slot: 9 });
        let encoded = status.encode();
        assert_eq!(encoded.len(), status.encode_size());
        assert_eq!(Status::read(&mut &encoded[..]).unwrap(), status);
        assert!(Status::read(&mut &[2u8][..]).is_err());
    }
}
