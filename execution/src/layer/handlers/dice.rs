use super::super::*;
use crate::{
    dice::{bankroll, max_liability, resolve, verify_attestation},
    state::{load_bet, load_vault},
};
use dicehouse_types::{
    dice::{validate_wager, Bet, Vault, TIMEOUT_SLOTS},
    execution::Account,
};
use tracing::info;

impl<'a, S: State> Layer<'a, S> {
    // === Dice Handler Methods ===

    pub(in crate::layer) async fn handle_deposit(
        &mut self,
        public: &PublicKey,
        amount: u64,
    ) -> Result<Vec<Event>, TransitionError> {
        if amount == 0 {
            return Err(BetError::InvalidAmount.into());
        }
        let mut account = load_account(self, public).await?;
        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or(BetError::Overflow)?;
        let balance = account.balance;
        self.insert(Key::Account(public.clone()), Value::Account(account));

        Ok(vec![Event::Deposited {
            player: public.clone(),
            amount,
            balance,
        }])
    }

    pub(in crate::layer) async fn handle_initialize_vault(
        &mut self,
        public: &PublicKey,
        initial_funding: u64,
    ) -> Result<Vec<Event>, TransitionError> {
        if load_vault(self, public).await?.is_some() {
            return Err(BetError::VaultExists.into());
        }
        if initial_funding == 0 {
            return Err(BetError::InvalidAmount.into());
        }
        let mut account = load_account(self, public).await?;
        debit_account(&mut account, initial_funding)?;

        let mut vault = Vault::new(public.clone());
        bankroll::fund(&mut vault, initial_funding)?;
        let address = vault.address();
        let balance = vault.balance;

        self.insert(Key::Account(public.clone()), Value::Account(account));
        self.insert(Key::Vault(public.clone()), Value::Vault(vault));
        info!(house = ?public, balance, "vault initialized");

        Ok(vec![Event::VaultInitialized {
            house: public.clone(),
            vault: address,
            balance,
        }])
    }

    pub(in crate::layer) async fn handle_place_bet(
        &mut self,
        public: &PublicKey,
        house: &PublicKey,
        seed: u128,
        roll: u8,
        amount: u64,
    ) -> Result<Vec<Event>, TransitionError> {
        validate_wager(roll, amount)?;
        let mut vault = load_vault(self, house)
            .await?
            .ok_or(BetError::VaultNotFound)?;
        if load_bet(self, house, seed).await?.is_some() {
            return Err(BetError::DuplicateBet { seed }.into());
        }

        let mut account = load_account(self, public).await?;
        debit_account(&mut account, amount)?;

        let bet = Bet::new(house, public.clone(), seed, self.slot, amount, roll)?;
        let liability = max_liability(amount, roll)?;
        bankroll::credit(&mut vault, amount)?;
        bankroll::reserve(&mut vault, liability)?;

        self.insert(Key::Account(public.clone()), Value::Account(account));
        self.insert(Key::Vault(house.clone()), Value::Vault(vault));
        self.insert(
            Key::Bet {
                house: house.clone(),
                seed,
            },
            Value::Bet(bet.clone()),
        );
        debug!(
            house = ?house,
            player = ?public,
            seed,
            roll,
            amount,
            liability,
            slot = self.slot,
            "bet placed"
        );

        Ok(vec![Event::BetPlaced {
            house: house.clone(),
            bet,
        }])
    }

    pub(in crate::layer) async fn handle_resolve_bet(
        &mut self,
        public: &PublicKey,
        house: &PublicKey,
        seed: u128,
        signature: &[u8],
    ) -> Result<Vec<Event>, TransitionError> {
        let bet = load_bet(self, house, seed)
            .await?
            .ok_or(BetError::BetNotFound)?;
        verify_attestation(house, &bet, signature)?;
        let outcome = resolve(&bet, signature)?;

        let mut vault = load_vault(self, house)
            .await?
            .ok_or(BetError::VaultNotFound)?;
        bankroll::release(&mut vault, max_liability(bet.amount, bet.roll)?)?;
        if outcome.won {
            bankroll::payout(&mut vault, outcome.payout)?;
            let mut account = load_account(self, &bet.player).await?;
            account.balance = account
                .balance
                .checked_add(outcome.payout)
                .ok_or(BetError::Overflow)?;
            self.insert(Key::Account(bet.player.clone()), Value::Account(account));
        }

        self.insert(Key::Vault(house.clone()), Value::Vault(vault));
        self.remove(Key::Bet {
            house: house.clone(),
            seed,
        });
        debug!(
            house = ?house,
            submitter = ?public,
            seed,
            result = outcome.result,
            won = outcome.won,
            payout = outcome.payout,
            "bet resolved"
        );

        Ok(vec![Event::BetResolved {
            house: house.clone(),
            seed,
            player: bet.player,
            roll: bet.roll,
            result: outcome.result,
            won: outcome.won,
            payout: outcome.payout,
        }])
    }

    pub(in crate::layer) async fn handle_refund_bet(
        &mut self,
        public: &PublicKey,
        house: &PublicKey,
        seed: u128,
    ) -> Result<Vec<Event>, TransitionError> {
        let bet = load_bet(self, house, seed)
            .await?
            .ok_or(BetError::BetNotFound)?;
        if bet.player != *public {
            return Err(BetError::Unauthorized.into());
        }
        let elapsed = self.slot.saturating_sub(bet.slot);
        if elapsed < TIMEOUT_SLOTS {
            return Err(BetError::TimeoutNotReached {
                elapsed,
                required: TIMEOUT_SLOTS,
            }
            .into());
        }

        let mut vault = load_vault(self, house)
            .await?
            .ok_or(BetError::VaultNotFound)?;
        bankroll::release(&mut vault, max_liability(bet.amount, bet.roll)?)?;
        bankroll::refund(&mut vault, bet.amount)?;
        let mut account = load_account(self, public).await?;
        account.balance = account
            .balance
            .checked_add(bet.amount)
            .ok_or(BetError::Overflow)?;

        self.insert(Key::Account(public.clone()), Value::Account(account));
        self.insert(Key::Vault(house.clone()), Value::Vault(vault));
        self.remove(Key::Bet {
            house: house.clone(),
            seed,
        });
        debug!(house = ?house, player = ?public, seed, elapsed, "bet refunded");

        Ok(vec![Event::BetRefunded {
            house: house.clone(),
            seed,
            player: bet.player,
            amount: bet.amount,
        }])
    }
}

fn debit_account(account: &mut Account, amount: u64) -> Result<(), BetError> {
    if account.balance < amount {
        return Err(BetError::InsufficientFunds {
            required: amount,
            available: account.balance,
        });
    }
    account.balance -= amount;
    Ok(())
}
