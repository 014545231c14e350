//! Burst agent entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config
//!   3. Resolve effective log level (CLI `-v` flags > config)
//!   4. Init logger once
//!   5. Build collaborators: draft store, LLM, ledger, pinning
//!   6. Spawn Ctrl-C → shutdown signal watcher
//!   7. Run the console until shutdown or end of input

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use burst_agent::config::{self, EnvOverrides};
use burst_agent::error::AppError;
use burst_agent::launch::aggregator::Aggregator;
use burst_agent::launch::builder::TransactionBuilder;
use burst_agent::nlu::Nlu;
use burst_agent::{console, ledger, llm, logger, pinning, store};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // Load .env if present; the file is optional.
    let _ = dotenvy::dotenv();

    let args = parse_cli_args();

    let config = match args.config_path.as_deref() {
        Some(path) => config::load_from(Path::new(path), &EnvOverrides::from_env())?,
        None => config::load()?,
    };

    let effective_log_level = args.log_level.unwrap_or(config.log_level.as_str());
    logger::init(effective_log_level, args.log_level.is_some())?;

    info!(
        agent_id = %config.agent_id,
        work_dir = %config.work_dir.display(),
        configured_log_level = %config.log_level,
        effective_log_level = %effective_log_level,
        "config loaded"
    );

    let drafts = store::build(&config.drafts, &config.work_dir)?;

    let provider = llm::providers::build(&config.llm, config.llm_api_key.clone())
        .map_err(|e| AppError::Config(e.to_string()))?;

    let ledger = ledger::build(&config.chain, config.avalanche_private_key.as_deref())
        .map_err(|e| AppError::Config(e.to_string()))?;

    let pinning = pinning::build(&config.pinning, config.pinata_jwt.clone())
        .map_err(|e| AppError::Config(e.to_string()))?;

    info!(
        store = drafts.store_type(),
        llm = %config.llm.provider,
        chain_mode = ?config.chain.mode,
        network = %config.chain.network,
        signer = %ledger.signer(),
        pinning = config.pinning.enabled,
        "collaborators ready"
    );

    let builder = TransactionBuilder::new(ledger, pinning, &config.chain, &config.pinning);
    let aggregator = Arc::new(Aggregator::new(
        config.agent_id.clone(),
        drafts,
        Nlu::new(provider),
        builder,
        config.confirmation_gate,
        config.drafts.ttl,
    ));

    // Ctrl-C cancels the token; the console watches it.
    let shutdown = CancellationToken::new();
    let ctrlc_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, shutting down");
            ctrlc_token.cancel();
        }
    });

    console::run(aggregator, &args.user, config.chain.network, shutdown).await?;

    info!("shutdown complete");
    Ok(())
}

struct CliArgs {
    log_level: Option<&'static str>,
    config_path: Option<String>,
    user: String,
}

fn parse_cli_args() -> CliArgs {
    let mut verbosity = 0u8;
    let mut config_path = None;
    let mut user = "console".to_string();

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "--" {
            break;
        }

        match arg.as_str() {
            "-h" | "--help" => {
                println!("Usage: burst-agent [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -h, --help                 Print help");
                println!("  -f, --config <PATH>        Path to configuration file (default: config/default.toml)");
                println!("  -u, --user <ID>            User id for the console session (default: console)");
                println!("  -v, -vv, -vvv, -vvvv       Increase logging verbosity");
                std::process::exit(0);
            }
            "-f" | "--config" => match iter.next() {
                Some(path) => config_path = Some(path),
                None => {
                    eprintln!("error: -f/--config requires a path argument");
                    std::process::exit(1);
                }
            },
            "-u" | "--user" => match iter.next() {
                Some(id) if !id.trim().is_empty() => user = id,
                _ => {
                    eprintln!("error: -u/--user requires a non-empty id");
                    std::process::exit(1);
                }
            },
            "--verbose" => verbosity = verbosity.saturating_add(1),
            a if a.starts_with('-') && a.len() > 1 && a.chars().skip(1).all(|c| c == 'v') => {
                verbosity = verbosity.saturating_add((a.len() - 1) as u8);
            }
            _ => {}
        }
    }

    // Each -v raises verbosity one tier:
    //   -v      → warn
    //   -vv     → info
    //   -vvv    → debug  (turn flow, merged fields, curve choice)
    //   -vvvv+  → trace  (full LLM payloads)
    let log_level = match verbosity {
        0 => None,
        1 => Some("warn"),
        2 => Some("info"),
        3 => Some("debug"),
        _ => Some("trace"),
    };

    CliArgs { log_level, config_path, user }
}
