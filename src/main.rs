use anyhow::{bail, Context, Result};
use base64::Engine;
use std::time::Duration;
use tradebot::{
    arguments::{is_polling_only_enabled, patterns, print_debug_info, print_help},
    config,
    confirmation::{ConfirmationEngine, ConfirmationResult},
    logger::{self, LogTag},
    rpc::{parse_commitment, validate_signature},
};

/// Entry point for the tradebot confirmation tool
///
/// Confirms an existing signature (`--signature`) or submits a signed
/// transaction and confirms it (`--submit`). The exit code reflects the
/// outcome: 0 confirmed, 1 failed on-chain, 2 not confirmed, 3 usage or
/// setup error.
#[tokio::main]
async fn main() {
    logger::init();

    if patterns::is_help_requested() {
        print_help();
        std::process::exit(0);
    }

    print_debug_info();

    let code = match run().await {
        Ok(result) => match result {
            ConfirmationResult::Confirmed => 0,
            ConfirmationResult::Failed(_) => 1,
            _ => 2,
        },
        Err(e) => {
            logger::error(LogTag::System, &format!("❌ {:#}", e));
            3
        }
    };

    logger::flush();
    std::process::exit(code);
}

async fn run() -> Result<ConfirmationResult> {
    let loaded = match patterns::get_config_path() {
        Some(path) => config::load_config_from_path(&path),
        None => config::load_config(),
    };
    loaded
        .map_err(anyhow::Error::msg)
        .context("Failed to load configuration")?;

    let mut cfg = config::get_config_clone();
    if is_polling_only_enabled() {
        cfg.websocket.enabled = false;
    }

    let commitment_name =
        patterns::get_commitment().unwrap_or_else(|| cfg.confirmation.commitment.clone());
    let commitment = match parse_commitment(&commitment_name) {
        Some(level) => level,
        None => bail!("Unknown commitment level '{}'", commitment_name),
    };
    let timeout = Duration::from_secs(
        patterns::get_timeout_seconds().unwrap_or(cfg.confirmation.timeout_secs),
    );

    let engine = ConfirmationEngine::from_config_with(&cfg)
        .context("Failed to build confirmation engine")?;
    logger::info(
        LogTag::System,
        &format!(
            "🚀 tradebot starting (rpc: {}, push: {})",
            cfg.rpc.url,
            if engine.push_enabled() { "on" } else { "off" }
        ),
    );

    let outcome = if let Some(signature) = patterns::get_signature() {
        validate_signature(&signature)?;
        let result = engine.confirm(&signature, commitment, timeout).await;
        Ok((signature, result))
    } else if let Some(payload) = patterns::get_submit_payload() {
        let raw = base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .context("--submit expects a base64-encoded signed transaction")?;
        logger::debug(
            LogTag::Rpc,
            &format!("Submitting transaction of {} bytes", raw.len()),
        );
        engine
            .submit_and_confirm(payload.trim(), commitment, timeout)
            .await
            .context("Transaction submission failed")
    } else {
        print_help();
        bail!("Either --signature or --submit is required");
    };

    engine.shutdown().await;
    let (signature, result) = outcome?;

    let summary = result.summary(&signature);
    match &result {
        ConfirmationResult::Confirmed => {
            logger::info(LogTag::Confirm, &format!("✅ {}", summary))
        }
        ConfirmationResult::Failed(_) => {
            logger::error(LogTag::Confirm, &format!("❌ {}", summary))
        }
        _ => logger::warning(LogTag::Confirm, &format!("⏳ {}", summary)),
    }
    println!("{} {}", result.label(), signature);

    Ok(result)
}
