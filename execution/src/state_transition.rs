//! Apply a block's transactions to state at a ledger slot.
//!
//! Slots must strictly increase from one block to the next. Outputs are
//! returned to the caller together with a digest over their encoding, so two
//! executions of the same block against the same state can be compared.

use crate::{
    state::{ledger_slot, State, Status},
    Layer,
};
use anyhow::{anyhow, Context as _};
use commonware_codec::Encode;
use commonware_cryptography::{
    ed25519::PublicKey,
    sha256::{Digest, Sha256},
    Hasher,
};
use dicehouse_types::execution::{Key, Output, Transaction, Value, MAX_BLOCK_TRANSACTIONS};
use std::collections::BTreeMap;
use tracing::info;

/// Result of executing a block's state transition
pub struct StateTransitionResult {
    pub slot: u64,
    /// Events and transactions in execution order, terminated by `Output::Commit`.
    pub outputs: Vec<Output>,
    pub outputs_digest: Digest,
    /// Map of public keys to their next expected nonce after processing
    pub processed_nonces: BTreeMap<PublicKey, u64>,
}

/// Execute state transition for a block
///
/// Runs every transaction through a [Layer] at `slot`, then applies the
/// resulting change set (and the new ledger slot) to `state` in one step.
pub async fn execute_state_transition<S: State>(
    state: &mut S,
    slot: u64,
    transactions: Vec<Transaction>,
) -> anyhow::Result<StateTransitionResult> {
    if transactions.len() > MAX_BLOCK_TRANSACTIONS {
        return Err(anyhow!(
            "block too large: {} transactions (max {MAX_BLOCK_TRANSACTIONS})",
            transactions.len()
        ));
    }
    if let Some(last) = ledger_slot(state).await.context("read ledger slot")? {
        if slot <= last {
            return Err(anyhow!(
                "non-increasing slot: ledger_slot={last}, requested={slot}"
            ));
        }
    }

    let mut layer = Layer::new(&*state, slot);
    let (mut outputs, processed_nonces) = layer
        .execute(transactions)
        .await
        .with_context(|| format!("execute layer (slot={slot})"))?;
    let mut changes = layer.commit();
    changes.push((Key::Ledger, Status::Update(Value::Ledger { slot })));
    state
        .apply(changes)
        .await
        .with_context(|| format!("apply state changes (slot={slot})"))?;
    outputs.push(Output::Commit { slot });

    let mut hasher = Sha256::new();
    for output in &outputs {
        hasher.update(output.encode().as_ref());
    }
    let outputs_digest = hasher.finalize();
    info!(slot, outputs = outputs.len(), "block committed");

    Ok(StateTransitionResult {
        slot,
        outputs,
        outputs_digest,
        processed_nonces,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mocks::{create_account_keypair, create_resolve},
        state::{load_account, load_bet, load_vault, Memory},
    };
    use commonware_runtime::deterministic::Runner;
    use commonware_runtime::Runner as _;
    use dicehouse_types::{execution::Instruction, Event};

    fn opening_block(seed: u64) -> Vec<Transaction> {
        let (house, house_public) = create_account_keypair(seed);
        let (player, _) = create_account_keypair(seed + 1);
        vec![
            Transaction::sign(&house, 0, Instruction::Deposit { amount: 1_000_000 }),
            Transaction::sign(
                &house,
                1,
                Instruction::InitializeVault {
                    initial_funding: 1_000_000,
                },
            ),
            Transaction::sign(&player, 0, Instruction::Deposit { amount: 5_000 }),
            Transaction::sign(
                &player,
                1,
                Instruction::PlaceBet {
                    house: house_public,
                    seed: 42,
                    roll: 50,
                    amount: 1_000,
                },
            ),
        ]
    }

    #[test]
    fn test_slots_must_increase() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let mut state = Memory::default();
            let result = execute_state_transition(&mut state, 5, vec![]).await.unwrap();
            assert_eq!(result.outputs, vec![Output::Commit { slot: 5 }]);
            assert_eq!(ledger_slot(&state).await.unwrap(), Some(5));

            assert!(execute_state_transition(&mut state, 5, vec![]).await.is_err());
            assert!(execute_state_transition(&mut state, 4, vec![]).await.is_err());
            execute_state_transition(&mut state, 6, vec![]).await.unwrap();
            assert_eq!(ledger_slot(&state).await.unwrap(), Some(6));
        });
    }

    #[test]
    fn test_execution_is_deterministic() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let mut first = Memory::default();
            let mut second = Memory::default();
            let a = execute_state_transition(&mut first, 1, opening_block(10))
                .await
                .unwrap();
            let b = execute_state_transition(&mut second, 1, opening_block(10))
                .await
                .unwrap();
            assert_eq!(a.outputs, b.outputs);
            assert_eq!(a.outputs_digest, b.outputs_digest);
            assert_eq!(a.processed_nonces, b.processed_nonces);
            assert_eq!(first.len(), second.len());
        });
    }

    #[test]
    fn test_full_round_across_blocks() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let (house, house_public) = create_account_keypair(10);
            let (player, player_public) = create_account_keypair(11);
            let mut state = Memory::default();
            let result = execute_state_transition(&mut state, 1, opening_block(10))
                .await
                .unwrap();
            assert_eq!(result.processed_nonces.get(&house_public), Some(&2));
            assert_eq!(result.processed_nonces.get(&player_public), Some(&2));

            let bet = load_bet(&state, &house_public, 42).await.unwrap().unwrap();
            assert_eq!(bet.slot, 1);
            let result = execute_state_transition(
                &mut state,
                2,
                vec![create_resolve(&house, 2, &house, &bet)],
            )
            .await
            .unwrap();
            let resolved = result.outputs.iter().find_map(|output| match output {
                Output::Event(Event::BetResolved { won, payout, .. }) => Some((*won, *payout)),
                _ => None,
            });
            let (won, payout) = resolved.expect("bet resolved");
            assert_eq!(payout, if won { 1_980 } else { 0 });

            assert!(load_bet(&state, &house_public, 42).await.unwrap().is_none());
            let account = load_account(&state, &player_public).await.unwrap();
            assert_eq!(account.balance, 4_000 + payout);
            let vault = load_vault(&state, &house_public).await.unwrap().unwrap();
            assert_eq!(vault.balance, 1_001_000 - payout);
            assert_eq!(vault.exposure, 0);

            // Replaying the resolution in a later block finds no bet.
            let replay = Transaction::sign(
                &player,
                2,
                Instruction::ResolveBet {
                    house: house_public.clone(),
                    seed: 42,
                    signature: vec![0u8; 64],
                },
            );
            let result = execute_state_transition(&mut state, 3, vec![replay])
                .await
                .unwrap();
            assert!(result.outputs.iter().any(|output| matches!(
                output,
                Output::Event(Event::BetRejected { error_code, .. })
                    if *error_code == dicehouse_types::dice::ERROR_BET_NOT_FOUND
            )));
        });
    }

    #[test]
    fn test_rejects_oversized_block() {
        let executor = Runner::default();
        executor.start(|_| async move {
            let (signer, _) = create_account_keypair(1);
            let transactions = (0..=MAX_BLOCK_TRANSACTIONS as u64)
                .map(|nonce| Transaction::sign(&signer, nonce, Instruction::Deposit { amount: 1 }))
                .collect();
            let mut state = Memory::default();
            assert!(execute_state_transition(&mut state, 1, transactions)
                .await
                .is_err());
            assert!(state.is_empty());
        });
    }
}
