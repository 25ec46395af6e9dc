use anyhow::{Context as _, Result};
use commonware_cryptography::ed25519::PublicKey;
use dicehouse_types::{
    dice::BetError,
    execution::{Event, Instruction, Key, Output, Transaction, Value},
};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::state::{load_account, validate_and_increment_nonce, PrepareError, State, Status};

mod handlers;

/// Failure of a single transaction after its nonce was consumed.
///
/// `Rejected` rolls the transaction back and is reported as a `BetRejected`
/// event. `State` aborts the whole block.
#[derive(Debug)]
pub enum TransitionError {
    Rejected(BetError),
    State(anyhow::Error),
}

impl From<BetError> for TransitionError {
    fn from(err: BetError) -> Self {
        Self::Rejected(err)
    }
}

impl From<anyhow::Error> for TransitionError {
    fn from(err: anyhow::Error) -> Self {
        Self::State(err)
    }
}

pub struct Layer<'a, S: State> {
    state: &'a S,
    pending: BTreeMap<Key, Status>,

    slot: u64,
}

impl<'a, S: State> Layer<'a, S> {
    pub fn new(state: &'a S, slot: u64) -> Self {
        Self {
            state,
            pending: BTreeMap::new(),

            slot,
        }
    }

    fn insert(&mut self, key: Key, value: Value) {
        self.pending.insert(key, Status::Update(value));
    }

    fn remove(&mut self, key: Key) {
        self.pending.insert(key, Status::Delete);
    }

    async fn prepare(&mut self, transaction: &Transaction) -> Result<(), PrepareError> {
        let mut account = load_account(self, &transaction.public)
            .await
            .map_err(PrepareError::State)?;
        validate_and_increment_nonce(&mut account, transaction.nonce)?;
        self.insert(
            Key::Account(transaction.public.clone()),
            Value::Account(account),
        );

        Ok(())
    }

    async fn apply(&mut self, transaction: &Transaction) -> Result<Vec<Event>, TransitionError> {
        let public = &transaction.public;

        match &transaction.instruction {
            Instruction::Deposit { amount } => self.handle_deposit(public, *amount).await,
            Instruction::InitializeVault { initial_funding } => {
                self.handle_initialize_vault(public, *initial_funding).await
            }
            Instruction::PlaceBet {
                house,
                seed,
                roll,
                amount,
            } => {
                self.handle_place_bet(public, house, *seed, *roll, *amount)
                    .await
            }
            Instruction::ResolveBet {
                house,
                seed,
                signature,
            } => {
                self.handle_resolve_bet(public, house, *seed, signature)
                    .await
            }
            Instruction::RefundBet { house, seed } => {
                self.handle_refund_bet(public, house, *seed).await
            }
        }
    }

    /// Execute `transactions` in order.
    ///
    /// Transactions with an invalid signature or an unexpected nonce are dropped.
    /// Every other transaction consumes its nonce; if its instruction is rejected,
    /// all of its other writes are discarded and a `BetRejected` event is emitted.
    pub async fn execute(
        &mut self,
        transactions: Vec<Transaction>,
    ) -> Result<(Vec<Output>, BTreeMap<PublicKey, u64>)> {
        let mut processed_nonces = BTreeMap::new();
        let mut outputs = Vec::new();

        for tx in transactions {
            if !tx.verify() {
                warn!(public = ?tx.public, nonce = tx.nonce, "invalid signature; dropping transaction");
                continue;
            }
            match self.prepare(&tx).await {
                Ok(()) => {}
                Err(PrepareError::NonceMismatch { expected, got }) => {
                    debug!(
                        public = ?tx.public,
                        expected,
                        got,
                        "nonce mismatch; dropping transaction"
                    );
                    continue;
                }
                Err(PrepareError::State(err)) => {
                    return Err(err).context("state error during prepare");
                }
            }
            processed_nonces.insert(tx.public.clone(), tx.nonce.saturating_add(1));

            let checkpoint = self.pending.clone();
            match self.apply(&tx).await {
                Ok(events) => outputs.extend(events.into_iter().map(Output::Event)),
                Err(TransitionError::Rejected(err)) => {
                    self.pending = checkpoint;
                    debug!(
                        public = ?tx.public,
                        slot = self.slot,
                        code = err.code(),
                        %err,
                        "transition rejected"
                    );
                    outputs.push(Output::Event(handlers::bet_rejected(&tx.public, &err)));
                }
                Err(TransitionError::State(err)) => {
                    return Err(err).context("state error during apply");
                }
            }
            outputs.push(Output::Transaction(tx));
        }

        Ok((outputs, processed_nonces))
    }

    pub fn commit(self) -> Vec<(Key, Status)> {
        self.pending.into_iter().collect()
    }
}

impl<'a, S: State> State for Layer<'a, S> {
    async fn get(&self, key: &Key) -> Result<Option<Value>> {
        Ok(match self.pending.get(key) {
            Some(Status::Update(value)) => Some(value.clone()),
            Some(Status::Delete) => None,
            None => self.state.get(key).await?,
        })
    }

    async fn insert(&mut self, key: Key, value: Value) -> Result<()> {
        self.pending.insert(key, Status::Update(value));
        Ok(())
    }

    async fn delete(&mut self, key: &Key) -> Result<()> {
        self.pending.insert(key.clone(), Status::Delete);
        Ok(())
    }
}
