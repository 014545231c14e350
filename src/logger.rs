//! Logging to stderr via tracing-subscriber.
//!
//! Stdout belongs to the console conversation, so every log line goes to
//! stderr. Call [`init`] once, after the CLI `-v` flags and config are merged.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::error::AppError;

/// Transport crates under the ledger, LLM and pinning clients. At `debug` and
/// `trace` they log every frame, which buries the launch flow.
const QUIET_DEPS: &[&str] = &["hyper", "hyper_util", "h2", "rustls", "alloy_transport_http"];

/// Expand a bare level (`"debug"`) into filter directives that keep the
/// transport crates at `info` or quieter. Full directives such as
/// `"info,burst_agent::ledger=trace"` pass through untouched.
pub fn filter_directives(level: &str) -> Result<String, AppError> {
    let level = level.trim();
    if level.is_empty() {
        return Err(AppError::Logger("log level must not be empty".into()));
    }
    if level.contains(['=', ',']) {
        return Ok(level.to_string());
    }
    let parsed = level
        .parse::<LevelFilter>()
        .map_err(|_| AppError::Logger(format!("unrecognised log level: '{level}'")))?;
    let deps = parsed.min(LevelFilter::INFO);
    let mut out = level.to_ascii_lowercase();
    for dep in QUIET_DEPS {
        out.push_str(&format!(",{dep}={deps}"));
    }
    Ok(out.to_ascii_lowercase())
}

/// Install the global subscriber.
///
/// With `prefer_level` (set when `-v` was given) `level` wins over `RUST_LOG`;
/// otherwise `RUST_LOG` wins and `level` from config is the fallback.
pub fn init(level: &str, prefer_level: bool) -> Result<(), AppError> {
    let from_level = || -> Result<EnvFilter, AppError> {
        let directives = filter_directives(level)?;
        EnvFilter::try_new(&directives)
            .map_err(|e| AppError::Logger(format!("invalid log level '{level}': {e}")))
    };

    let filter = if prefer_level {
        match from_level() {
            Ok(filter) => filter,
            Err(level_err) => EnvFilter::try_from_default_env().map_err(|env_err| {
                AppError::Logger(format!("{level_err}; RUST_LOG parse failed: {env_err}"))
            })?,
        }
    } else {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => from_level()?,
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| AppError::Logger(format!("failed to set subscriber: {e}")))?;

    Ok(())
}
