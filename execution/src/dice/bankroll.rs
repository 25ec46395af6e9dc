//! Vault bankroll accounting.
//!
//! `balance` holds the house funds plus every escrowed stake. Each open bet
//! reserves its worst-case liability in `exposure`, and `exposure <= balance`
//! holds after every operation here.

use dicehouse_types::dice::{BetError, Vault};

/// Seed a freshly created vault with house funds.
pub fn fund(vault: &mut Vault, amount: u64) -> Result<(), BetError> {
    if amount == 0 {
        return Err(BetError::InvalidAmount);
    }
    vault.balance = vault
        .balance
        .checked_add(amount)
        .ok_or(BetError::Overflow)?;
    Ok(())
}

/// Move a player's stake into escrow.
pub fn credit(vault: &mut Vault, amount: u64) -> Result<(), BetError> {
    vault.balance = vault
        .balance
        .checked_add(amount)
        .ok_or(BetError::Overflow)?;
    Ok(())
}

/// Reserve `liability` for a new open bet.
pub fn reserve(vault: &mut Vault, liability: u64) -> Result<(), BetError> {
    if liability > vault.free_balance() {
        return Err(BetError::InsufficientBankroll {
            required: liability,
            available: vault.free_balance(),
        });
    }
    let exposure = vault
        .exposure
        .checked_add(liability)
        .ok_or(BetError::Overflow)?;
    vault.exposure = exposure;
    vault.open_bets = vault.open_bets.checked_add(1).ok_or(BetError::Overflow)?;
    Ok(())
}

/// Release the liability of a bet that is being settled.
pub fn release(vault: &mut Vault, liability: u64) -> Result<(), BetError> {
    vault.exposure = vault
        .exposure
        .checked_sub(liability)
        .ok_or(BetError::Overflow)?;
    vault.open_bets = vault.open_bets.checked_sub(1).ok_or(BetError::Overflow)?;
    Ok(())
}

/// Pay a winning bet out of the vault.
pub fn payout(vault: &mut Vault, amount: u64) -> Result<(), BetError> {
    debit(vault, amount)
}

/// Return an escrowed stake after the resolution window lapsed.
pub fn refund(vault: &mut Vault, amount: u64) -> Result<(), BetError> {
    debit(vault, amount)
}

fn debit(vault: &mut Vault, amount: u64) -> Result<(), BetError> {
    if amount > vault.balance {
        return Err(BetError::InsufficientBankroll {
            required: amount,
            available: vault.balance,
        });
    }
    vault.balance -= amount;
    Ok(())
}
