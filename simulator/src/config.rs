use commonware_codec::DecodeExt;
use commonware_cryptography::{
    ed25519::{PrivateKey, PublicKey},
    Signer,
};
use commonware_utils::{from_hex_formatted, hex};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;
use tracing::Level;

#[derive(Clone, PartialEq, Eq)]
pub struct HexBytes(Vec<u8>);

impl AsRef<[u8]> for HexBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for HexBytes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&hex(self.as_ref()))
    }
}

impl<'de> Deserialize<'de> for HexBytes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        let bytes = from_hex_formatted(&value)
            .ok_or_else(|| serde::de::Error::custom("expected a hex string"))?;
        Ok(Self(bytes))
    }
}

/// Configuration for the [crate::Engine].
#[derive(Deserialize, Serialize)]
pub struct Config {
    /// Ed25519 private key of the house (signs attestations, owns the vault).
    pub house_key: HexBytes,
    /// Ed25519 private key of the simulated player.
    pub player_key: HexBytes,

    pub log_level: String,

    #[serde(default = "default_vault_funding")]
    pub vault_funding: u64,
    #[serde(default = "default_player_funding")]
    pub player_funding: u64,
    #[serde(default)]
    pub start_slot: u64,
}

fn default_vault_funding() -> u64 {
    10_000_000_000
}

fn default_player_funding() -> u64 {
    1_000_000_000
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} is invalid: {value}")]
    InvalidDecode {
        field: &'static str,
        value: String,
        #[source]
        source: commonware_codec::Error,
    },
    #[error("invalid log level: {value}")]
    InvalidLogLevel { value: String },
    #[error("{field} must be > 0 (got {value})")]
    InvalidNonZero { field: &'static str, value: u64 },
    #[error("house_key and player_key must differ")]
    KeyConflict,
}

pub struct ValidatedConfig {
    pub house: PrivateKey,
    pub player: PrivateKey,
    pub log_level: Level,
    pub vault_funding: u64,
    pub player_funding: u64,
    pub start_slot: u64,
}

impl fmt::Debug for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatedConfig")
            .field("house", &self.house.public_key())
            .field("player", &self.player.public_key())
            .field("log_level", &self.log_level)
            .field("vault_funding", &self.vault_funding)
            .field("player_funding", &self.player_funding)
            .field("start_slot", &self.start_slot)
            .finish()
    }
}

impl ValidatedConfig {
    pub fn house_public(&self) -> PublicKey {
        self.house.public_key()
    }
}

impl Config {
    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        let house: PrivateKey = decode_bytes("house_key", &self.house_key)?;
        let player: PrivateKey = decode_bytes("player_key", &self.player_key)?;
        if house.public_key() == player.public_key() {
            return Err(ConfigError::KeyConflict);
        }
        ensure_nonzero("vault_funding", self.vault_funding)?;
        ensure_nonzero("player_funding", self.player_funding)?;
        let log_level =
            Level::from_str(&self.log_level).map_err(|_| ConfigError::InvalidLogLevel {
                value: self.log_level.clone(),
            })?;

        Ok(ValidatedConfig {
            house,
            player,
            log_level,
            vault_funding: self.vault_funding,
            player_funding: self.player_funding,
            start_slot: self.start_slot,
        })
    }
}

fn decode_bytes<T: DecodeExt<()>>(field: &'static str, value: &HexBytes) -> Result<T, ConfigError> {
    T::decode(value.as_ref()).map_err(|source| ConfigError::InvalidDecode {
        field,
        value: "<redacted>".to_string(),
        source,
    })
}

fn ensure_nonzero(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidNonZero { field, value });
    }
    Ok(())
}
