//! In-process settlement engine driven block by block.
//!
//! Every call executes one block at the next slot against an in-memory
//! registry. The engine plays both sides: the player submits bets and refunds,
//! the house signs canonical messages and submits resolutions.

use anyhow::{anyhow, Context as _, Result};
use commonware_cryptography::{
    ed25519::{PrivateKey, PublicKey},
    Signer,
};
use dicehouse_execution::{
    dice::sign_attestation, load_account, load_bet, load_vault, nonce,
    state_transition::execute_state_transition, Memory,
};
use dicehouse_types::{
    execution::{Instruction, Output, Transaction},
    Bet, Event, Vault,
};
use tracing::{debug, info, warn};

use crate::ValidatedConfig;

pub struct Engine {
    state: Memory,
    house: PrivateKey,
    player: PrivateKey,
    slot: u64,
}

impl Engine {
    /// Fund both parties and open the house vault in the first block.
    pub async fn open(config: &ValidatedConfig) -> Result<Self> {
        let mut engine = Self {
            state: Memory::default(),
            house: config.house.clone(),
            player: config.player.clone(),
            slot: config.start_slot,
        };
        let house = engine.house.clone();
        let player = engine.player.clone();
        let transactions = vec![
            Transaction::sign(
                &house,
                0,
                Instruction::Deposit {
                    amount: config.vault_funding,
                },
            ),
            Transaction::sign(
                &house,
                1,
                Instruction::InitializeVault {
                    initial_funding: config.vault_funding,
                },
            ),
            Transaction::sign(
                &player,
                0,
                Instruction::Deposit {
                    amount: config.player_funding,
                },
            ),
        ];
        let events = engine.execute_at(config.start_slot, transactions).await?;
        ensure_accepted(&events)?;
        info!(
            house = ?house.public_key(),
            vault_funding = config.vault_funding,
            player_funding = config.player_funding,
            "engine opened"
        );
        Ok(engine)
    }

    pub fn slot(&self) -> u64 {
        self.slot
    }

    pub fn house(&self) -> PublicKey {
        self.house.public_key()
    }

    pub fn player(&self) -> PublicKey {
        self.player.public_key()
    }

    pub async fn balance(&self, public: &PublicKey) -> Result<u64> {
        Ok(load_account(&self.state, public).await?.balance)
    }

    pub async fn vault(&self) -> Result<Vault> {
        load_vault(&self.state, &self.house())
            .await?
            .ok_or_else(|| anyhow!("vault missing"))
    }

    pub async fn bet(&self, seed: u128) -> Result<Option<Bet>> {
        load_bet(&self.state, &self.house(), seed).await
    }

    /// Skip `slots` without executing anything.
    pub fn advance(&mut self, slots: u64) {
        self.slot = self.slot.saturating_add(slots);
        debug!(slot = self.slot, "advanced");
    }

    /// Sign the canonical message of `bet` with the house key.
    pub fn attest(&self, bet: &Bet) -> Vec<u8> {
        sign_attestation(&self.house, bet)
    }

    pub async fn place(&mut self, seed: u128, roll: u8, amount: u64) -> Result<Bet> {
        let player = self.player.clone();
        let tx = self
            .sign(
                &player,
                Instruction::PlaceBet {
                    house: self.house(),
                    seed,
                    roll,
                    amount,
                },
            )
            .await?;
        let events = self.execute(vec![tx]).await?;
        ensure_accepted(&events)?;
        events
            .into_iter()
            .find_map(|event| match event {
                Event::BetPlaced { bet, .. } => Some(bet),
                _ => None,
            })
            .ok_or_else(|| anyhow!("missing BetPlaced event"))
    }

    /// Have the house attest the open bet at `seed` and submit the resolution.
    pub async fn resolve(&mut self, seed: u128) -> Result<Event> {
        let bet = self
            .bet(seed)
            .await?
            .ok_or_else(|| anyhow!("no open bet with seed {seed}"))?;
        let signature = self.attest(&bet);
        let house = self.house.clone();
        let tx = self
            .sign(
                &house,
                Instruction::ResolveBet {
                    house: house.public_key(),
                    seed,
                    signature,
                },
            )
            .await?;
        let events = self.execute(vec![tx]).await?;
        ensure_accepted(&events)?;
        single_event(events)
    }

    pub async fn refund(&mut self, seed: u128) -> Result<Event> {
        let player = self.player.clone();
        let tx = self
            .sign(
                &player,
                Instruction::RefundBet {
                    house: self.house(),
                    seed,
                },
            )
            .await?;
        let events = self.execute(vec![tx]).await?;
        ensure_accepted(&events)?;
        single_event(events)
    }

    async fn sign(&self, signer: &PrivateKey, instruction: Instruction) -> Result<Transaction> {
        let nonce = nonce(&self.state, &signer.public_key()).await?;
        Ok(Transaction::sign(signer, nonce, instruction))
    }

    async fn execute(&mut self, transactions: Vec<Transaction>) -> Result<Vec<Event>> {
        let slot = self.slot.checked_add(1).context("slot overflow")?;
        self.execute_at(slot, transactions).await
    }

    async fn execute_at(&mut self, slot: u64, transactions: Vec<Transaction>) -> Result<Vec<Event>> {
        let result = execute_state_transition(&mut self.state, slot, transactions).await?;
        self.slot = result.slot;
        debug!(slot, digest = ?result.outputs_digest, "block executed");
        Ok(result
            .outputs
            .into_iter()
            .filter_map(|output| match output {
                Output::Event(event) => Some(event),
                _ => None,
            })
            .collect())
    }
}

fn ensure_accepted(events: &[Event]) -> Result<()> {
    for event in events {
        if let Event::BetRejected {
            error_code,
            message,
            ..
        } = event
        {
            warn!(error_code, reason = %message, "transaction rejected");
            return Err(anyhow!("rejected (code {error_code}): {message}"));
        }
    }
    Ok(())
}

fn single_event(mut events: Vec<Event>) -> Result<Event> {
    if events.len() != 1 {
        return Err(anyhow!("expected one event, got {}", events.len()));
    }
    events.pop().ok_or_else(|| anyhow!("no event"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{audit, Config};
    use dicehouse_types::dice::TIMEOUT_SLOTS;

    fn config() -> ValidatedConfig {
        let yaml = "house_key: \"0x0101010101010101010101010101010101010101010101010101010101010101\"\n\
                    player_key: \"0x0202020202020202020202020202020202020202020202020202020202020202\"\n\
                    log_level: debug\n\
                    vault_funding: 1000000000\n\
                    player_funding: 100000000\n\
                    start_slot: 10\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        config.validate().unwrap()
    }

    #[tokio::test]
    async fn test_play_round() {
        let mut engine = Engine::open(&config()).await.unwrap();
        assert_eq!(engine.slot(), 10);

        let bet = engine.place(1, 50, 100_000_000).await.unwrap();
        assert_eq!(bet.slot, 11);
        assert_eq!(engine.balance(&engine.player()).await.unwrap(), 0);
        assert_eq!(engine.vault().await.unwrap().exposure, 198_000_000);

        let signature = engine.attest(&bet);
        let report = audit(&engine.house(), &bet.message(), &signature).unwrap();
        let event = engine.resolve(1).await.unwrap();
        match event {
            Event::BetResolved {
                won,
                payout,
                result,
                ..
            } => {
                assert_eq!(won, report.won);
                assert_eq!(result, report.result);
                assert_eq!(payout, if won { 198_000_000 } else { 0 });
                assert_eq!(engine.balance(&engine.player()).await.unwrap(), payout);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(engine.bet(1).await.unwrap().is_none());
        assert_eq!(engine.vault().await.unwrap().exposure, 0);
    }

    #[tokio::test]
    async fn test_timeout_refund() {
        let mut engine = Engine::open(&config()).await.unwrap();
        let bet = engine.place(9, 10, 1_000).await.unwrap();

        let early = engine.refund(9).await.unwrap_err();
        assert!(early.to_string().contains("refund timeout not reached"));

        engine.advance(TIMEOUT_SLOTS);
        let event = engine.refund(9).await.unwrap();
        assert_eq!(
            event,
            Event::BetRefunded {
                house: engine.house(),
                seed: 9,
                player: bet.player.clone(),
                amount: 1_000,
            }
        );
        assert_eq!(
            engine.balance(&engine.player()).await.unwrap(),
            100_000_000
        );
        assert!(engine.resolve(9).await.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_seed_rejected() {
        let mut engine = Engine::open(&config()).await.unwrap();
        engine.place(3, 50, 1_000).await.unwrap();
        let err = engine.place(3, 50, 1_000).await.unwrap_err();
        assert!(err.to_string().contains("already open"));
    }
}
