/// Confirmation path debug tool
///
/// Exercises each layer separately: endpoint derivation, node health,
/// push-only confirmation and the full push-then-poll flow. Also quotes the
/// priority fee a tier would cost.
use clap::Parser;
use colored::Colorize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tradebot::confirmation::{
    ConfirmationEngine, ConfirmationResult, PollingFallback, PollingSettings,
};
use tradebot::config::{apply_env_overrides, Config};
use tradebot::fees::{choose_cu_price, priority_fee_lamports, priority_fee_sol};
use tradebot::logger;
use tradebot::rpc::{
    derive_pubsub_url, parse_commitment, validate_signature, EndpointRewriter, RpcClient,
};
use tradebot::websocket::{PubsubClient, PushSettings};

#[derive(Parser, Debug)]
#[clap(name = "debug_confirmation")]
#[clap(about = "Debug the push and polling confirmation paths")]
struct Args {
    /// Node HTTP RPC endpoint
    #[clap(long, default_value = "https://api.mainnet-beta.solana.com")]
    rpc_url: String,

    /// Pubsub endpoint (derived from --rpc-url when omitted)
    #[clap(long)]
    ws_url: Option<String>,

    /// Signature to confirm
    #[clap(long)]
    signature: Option<String>,

    /// processed | confirmed | finalized
    #[clap(long, default_value = "confirmed")]
    commitment: String,

    /// Push wait in seconds
    #[clap(long, default_value_t = 30)]
    timeout: u64,

    /// Skip the polling fallback
    #[clap(long)]
    push_only: bool,

    /// Only print the derived pubsub endpoint
    #[clap(long)]
    derive_only: bool,

    /// Quote the CU price and priority fee for a tier (fast | turbo | ultra)
    #[clap(long)]
    priority: Option<String>,

    /// Compute-unit limit used for the fee quote
    #[clap(long, default_value_t = 200_000)]
    compute_units: u32,

    /// Verbose output (raw frames)
    #[clap(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    logger::init();
    if args.verbose {
        let mut config = logger::get_logger_config();
        config.min_level = logger::LogLevel::Verbose;
        logger::set_logger_config(config);
    }

    println!("\n{}", "🔍 Confirmation Debug Tool".bold().cyan());
    println!("{}", "=".repeat(60).cyan());

    let ws_url = match args.ws_url.clone().or_else(|| derive_pubsub_url(&args.rpc_url)) {
        Some(url) => url,
        None => {
            println!("{} cannot derive pubsub endpoint from {}", "✗".red(), args.rpc_url);
            std::process::exit(1);
        }
    };
    let provider = url::Url::parse(&args.rpc_url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
        .and_then(|host| EndpointRewriter::default().match_host(&host).map(|r| r.name))
        .unwrap_or("generic");

    if let Some(tier) = args.priority.as_deref() {
        let mut config = Config::default();
        apply_env_overrides(&mut config, |key| std::env::var(key).ok());
        match choose_cu_price(Some(tier), &config.fees) {
            Some(price) => println!(
                "Priority:   {} -> {} micro-lamports/CU, {} lamports ({:.9} SOL) for {} CU",
                tier.yellow(),
                price,
                priority_fee_lamports(price, args.compute_units),
                priority_fee_sol(price, args.compute_units),
                args.compute_units
            ),
            None => println!("Priority:   {} -> no explicit CU price", tier.yellow()),
        }
    }

    println!("RPC URL:    {}", args.rpc_url.yellow());
    println!("Pubsub URL: {} ({})", ws_url.yellow(), provider);
    if args.derive_only {
        return;
    }

    let rpc = match RpcClient::new(&args.rpc_url, Duration::from_secs(15)) {
        Ok(rpc) => Arc::new(rpc),
        Err(e) => {
            println!("{} {}", "✗".red(), e);
            std::process::exit(1);
        }
    };

    let start = Instant::now();
    match rpc.get_health().await {
        Ok(()) => println!(
            "{} node healthy ({}ms)",
            "✓".green(),
            start.elapsed().as_millis()
        ),
        Err(e) => println!("{} node health: {}", "✗".red(), e),
    }

    let signature = match args.signature {
        Some(signature) => signature,
        None => {
            println!("\nNo --signature given, nothing to confirm");
            return;
        }
    };
    if let Err(e) = validate_signature(&signature) {
        println!("{} {}", "✗".red(), e);
        std::process::exit(1);
    }
    let commitment = match parse_commitment(&args.commitment) {
        Some(level) => level,
        None => {
            println!("{} unknown commitment '{}'", "✗".red(), args.commitment);
            std::process::exit(1);
        }
    };

    let engine = ConfirmationEngine::new(
        Some(PubsubClient::new(&ws_url, PushSettings::default())),
        PollingFallback::new(rpc.clone(), PollingSettings::default()),
    )
    .with_submitter(rpc);

    let timeout = Duration::from_secs(args.timeout);
    let start = Instant::now();
    let result = if args.push_only {
        engine.confirm_push_only(&signature, commitment, timeout).await
    } else {
        engine.confirm(&signature, commitment, timeout).await
    };
    engine.shutdown().await;

    let label = match &result {
        ConfirmationResult::Confirmed => result.label().green().bold(),
        ConfirmationResult::Failed(_) => result.label().red().bold(),
        _ => result.label().yellow().bold(),
    };
    println!(
        "\n{} in {}ms\n{}",
        label,
        start.elapsed().as_millis(),
        result.summary(&signature)
    );
    if let ConfirmationResult::SubscribeFailed(reason) | ConfirmationResult::TransportError(reason) =
        &result
    {
        println!("Detail: {}", reason.dimmed());
    }
}
