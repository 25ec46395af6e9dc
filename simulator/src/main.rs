use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commonware_utils::{from_hex_formatted, hex};
use dicehouse_simulator::{audit, Config, Engine};
use dicehouse_types::{dice::TIMEOUT_SLOTS, Event};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Local dice settlement simulator")]
struct Args {
    /// Path to the YAML configuration file
    #[arg(long, default_value = "simulator/dicehouse.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Place a bet and settle it with a house attestation.
    Play {
        #[arg(long, default_value_t = 1)]
        seed: u128,
        /// Win threshold (1..=99); the bet wins when the derived roll is below it.
        #[arg(long, default_value_t = 50)]
        roll: u8,
        #[arg(long, default_value_t = 100_000_000)]
        amount: u64,
    },
    /// Place a bet the house never answers and reclaim it after the timeout.
    Timeout {
        #[arg(long, default_value_t = 1)]
        seed: u128,
        #[arg(long, default_value_t = 50)]
        roll: u8,
        #[arg(long, default_value_t = 100_000_000)]
        amount: u64,
    },
    /// Verify an attestation against a canonical bet message and recompute the outcome.
    Audit {
        /// Canonical bet message (66 bytes, hex)
        #[arg(long)]
        message: String,
        /// House signature (64 bytes, hex)
        #[arg(long)]
        signature: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config_file = std::fs::read_to_string(&args.config)
        .with_context(|| format!("Could not read config file {}", args.config.display()))?;
    let config: Config =
        serde_yaml::from_str(&config_file).context("Could not parse config file")?;
    let config = config.validate().context("Invalid config")?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();
    info!(?config, "loaded config");

    match args.command {
        Command::Play { seed, roll, amount } => {
            let mut engine = Engine::open(&config).await?;
            let bet = engine.place(seed, roll, amount).await?;
            let signature = engine.attest(&bet);
            info!(
                canonical = hex(&bet.message()),
                signature = hex(&signature),
                "house attestation"
            );
            match engine.resolve(seed).await? {
                Event::BetResolved {
                    result,
                    won,
                    payout,
                    ..
                } => info!(roll, result, won, payout, "bet resolved"),
                other => warn!(?other, "unexpected event"),
            }
            let player = engine.player();
            info!(
                balance = engine.balance(&player).await?,
                vault = engine.vault().await?.balance,
                "settled"
            );
        }
        Command::Timeout { seed, roll, amount } => {
            let mut engine = Engine::open(&config).await?;
            let bet = engine.place(seed, roll, amount).await?;
            if let Err(err) = engine.refund(seed).await {
                info!(%err, "early refund refused");
            }
            engine.advance(TIMEOUT_SLOTS);
            let event = engine.refund(seed).await?;
            info!(?event, placed = bet.slot, slot = engine.slot(), "stake reclaimed");
        }
        Command::Audit { message, signature } => {
            let message = from_hex_formatted(&message).context("message must be hex")?;
            let signature = from_hex_formatted(&signature).context("signature must be hex")?;
            let report = audit(&config.house_public(), &message, &signature)?;
            info!(
                seed = report.bet.seed,
                roll = report.bet.roll,
                amount = report.bet.amount,
                result = report.result,
                won = report.won,
                payout = report.payout,
                "attestation verified"
            );
        }
    }
    Ok(())
}
