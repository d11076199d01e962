//! Callmux CLI Binary
//!
//! Command-line interface for the call batching engine. The `erc20`
//! subcommand issues several token reads in one scheduling window so they
//! travel as a single aggregate request.

use alloy_primitives::Address;
use anyhow::{anyhow, Context, Result};
use callmux::call::CallValue;
use callmux::channel::http::HttpChannel;
use callmux::codec::erc20::{self, Erc20Codec};
use callmux::config::CallmuxConfig;
use callmux::contract::ContractHandle;
use callmux::logging::init_logging;
use callmux::registry::AggregatorRegistry;
use callmux::types::BlockId;
use callmux::Multicaller;
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use serde_json::Value;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "callmux", version, about = "Batched read calls over JSON-RPC")]
struct Cli {
    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// JSON-RPC endpoint URL (overrides config)
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read token metadata with one aggregate request
    Erc20 {
        /// Token contract address
        token: String,

        /// Also read the balance of this address
        #[arg(long)]
        holder: Option<String>,

        /// Execution context, e.g. latest, finalized, 18000000, 0x112a880
        #[arg(long)]
        block: Option<String>,
    },

    /// Show the aggregator deployment used for a chain
    Aggregator {
        /// Chain id to resolve
        #[arg(long, default_value_t = 1)]
        chain_id: u64,
    },
}

// Window coalescing relies on cooperative scheduling: the flush task must
// run after every same-tick submitter, which only a single-threaded runtime
// guarantees.
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let mut config = match CallmuxConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            process::exit(1);
        }
    };
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    if let Some(url) = cli.rpc_url.clone() {
        config.rpc_url = Some(url);
    }

    if let Err(e) = init_logging(Some(&config.logging)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    if let Err(e) = run(&cli.command, &config).await {
        error!("Command failed: {}", e);
        eprintln!("{} {}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

async fn run(command: &Command, config: &CallmuxConfig) -> Result<()> {
    match command {
        Command::Erc20 {
            token,
            holder,
            block,
        } => erc20_report(config, token, holder.as_deref(), block.as_deref()).await,
        Command::Aggregator { chain_id } => aggregator_report(*chain_id),
    }
}

async fn erc20_report(
    config: &CallmuxConfig,
    token: &str,
    holder: Option<&str>,
    block: Option<&str>,
) -> Result<()> {
    let url = config
        .rpc_url
        .as_deref()
        .ok_or_else(|| anyhow!("No RPC URL configured; pass --rpc-url or set CALLMUX_RPC_URL"))?;
    let token: Address = token.parse().context("Invalid token address")?;

    let channel = Arc::new(HttpChannel::new(url)?);
    let engine = Multicaller::with_config(
        channel.clone(),
        Arc::new(Erc20Codec),
        config.engine_config()?,
    );
    engine.set_channel(channel, config.chain_id).await?;
    if let Some(block) = block {
        engine.set_default_block(block.parse::<BlockId>()?);
    }

    info!(token = %token, aggregator = %engine.aggregator_address(), "Reading token metadata");

    let handle = ContractHandle::new(token, engine);

    // All four reads land in the same window and travel as one request.
    let (name, symbol, decimals, total_supply) = tokio::join!(
        handle.call(erc20::name()),
        handle.call(erc20::symbol()),
        handle.call(erc20::decimals()),
        handle.call(erc20::total_supply()),
    );

    print_field("name", name.map(|v| render(&v)));
    print_field("symbol", symbol.map(|v| render(&v)));
    print_field("decimals", decimals.map(|v| render(&v)));
    print_field("totalSupply", total_supply.map(|v| render(&v)));

    if let Some(holder) = holder {
        let holder: Address = holder.parse().context("Invalid holder address")?;
        let balance = handle.call(erc20::balance_of(holder)).await;
        print_field("balanceOf", balance.map(|v| render(&v)));
    }

    Ok(())
}

fn aggregator_report(chain_id: u64) -> Result<()> {
    let registry = AggregatorRegistry::default();
    let deployment = registry.resolve(chain_id)?;
    println!(
        "{} {}",
        "chain:".bold(),
        chain_id.to_string().cyan()
    );
    println!("{} {}", "aggregator:".bold(), deployment.address.to_string().cyan());
    println!("{} {:?}", "mode:".bold(), deployment.mode);
    Ok(())
}

fn print_field<E: std::fmt::Display>(label: &str, value: Result<String, E>) {
    match value {
        Ok(value) => println!("{:>12}  {}", label.bold(), value.green()),
        Err(e) => println!("{:>12}  {}", label.bold(), e.to_string().red()),
    }
}

fn render(value: &CallValue) -> String {
    match value {
        CallValue::Single(value) => render_json(value),
        CallValue::Tuple(values) => {
            let parts: Vec<String> = values.iter().map(render_json).collect();
            format!("({})", parts.join(", "))
        }
    }
}

fn render_json(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
