//! Dice wagering domain types.
//!
//! Defines the bet record and its canonical attestation message, the house vault,
//! protocol constants and the typed rejection reasons used by the execution layer.

mod bet;
mod codec;
mod constants;
mod error;
mod vault;

pub use codec::{
    bytes_encode_size, read_bytes, read_string, string_encode_size, write_bytes, write_string,
};
pub use bet::{bet_address, bet_bump, validate_wager, vault_address, Bet};
pub use constants::*;
pub use error::BetError;
pub use vault::Vault;
