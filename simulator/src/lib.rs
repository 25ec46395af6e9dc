//! Local driver for the dicehouse settlement engine.
//!
//! Loads a YAML [Config], opens an in-memory [Engine] and plays bets end to end.
//! [audit] lets anyone re-derive an outcome from a published attestation.

mod audit;
pub use audit::{audit, AuditError, AuditReport};

mod config;
pub use config::{Config, ConfigError, HexBytes, ValidatedConfig};

mod engine;
pub use engine::Engine;
