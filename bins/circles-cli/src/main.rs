//! circles-cli — Command-line front end for a Circles hub.
//!
//! Every invocation loads the hub snapshot, executes one call through an
//! [`Executor`] stamped with the system clock, prints the result and the
//! emitted events, and saves the snapshot again if the call succeeded.

mod settings;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use circles_core::address::Address;
use circles_core::clock::SystemClock;
use circles_core::event::Receipt;
use circles_core::types::Amount;
use circles_ledger::{Executor, Hub};

use settings::HubSettings;

/// Circles personal-currency hub.
#[derive(Parser)]
#[command(name = "circles-cli")]
#[command(version, about = "Personal currencies with demurrage and continuous issuance")]
struct Cli {
    /// Hub snapshot file (default: <data dir>/circles/hub.json).
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Log output format ("text" or "json")
    #[arg(long, global = true, default_value = "text")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new hub snapshot.
    Init(InitArgs),
    #[command(flatten)]
    Hub(HubCommand),
}

/// Commands that operate on an existing snapshot.
#[derive(Subcommand)]
enum HubCommand {
    /// Print the hub parameters.
    Config,
    /// List every personal currency.
    Tokens,
    /// Create the caller's personal currency.
    Signup(SignupArgs),
    /// Move value from the caller.
    Transfer(TransferArgs),
    /// Set an allowance.
    Approve(AllowanceArgs),
    /// Raise an allowance.
    IncreaseAllowance(AllowanceArgs),
    /// Lower an allowance.
    DecreaseAllowance(AllowanceArgs),
    /// Spend an allowance.
    TransferFrom(TransferFromArgs),
    /// Query a settled balance.
    Balance(BalanceArgs),
    /// Query an allowance.
    Allowance(AllowanceQueryArgs),
    /// Query the total supply of a currency.
    Supply(TokenArg),
}

#[derive(Args)]
struct InitArgs {
    /// TOML file with hub parameters.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// System owner address (overrides the config file).
    #[arg(long)]
    system_owner: Option<Address>,

    /// Overwrite an existing snapshot.
    #[arg(long)]
    force: bool,
}

#[derive(Args)]
struct TokenArg {
    /// Currency: a ledger handle or the address of its owner.
    #[arg(short, long)]
    token: Address,
}

#[derive(Args)]
struct SignupArgs {
    /// Calling account.
    #[arg(long)]
    caller: Address,

    /// Name of the new currency.
    #[arg(short, long)]
    name: String,
}

#[derive(Args)]
struct TransferArgs {
    #[command(flatten)]
    token: TokenArg,

    #[arg(long)]
    caller: Address,

    #[arg(long)]
    to: Address,

    /// Amount in base units.
    #[arg(long)]
    value: Amount,
}

#[derive(Args)]
struct AllowanceArgs {
    #[command(flatten)]
    token: TokenArg,

    #[arg(long)]
    caller: Address,

    #[arg(long)]
    spender: Address,

    /// Amount in base units.
    #[arg(long)]
    value: Amount,
}

#[derive(Args)]
struct TransferFromArgs {
    #[command(flatten)]
    token: TokenArg,

    /// Spender issuing the call.
    #[arg(long)]
    caller: Address,

    #[arg(long)]
    from: Address,

    #[arg(long)]
    to: Address,

    /// Amount in base units.
    #[arg(long)]
    value: Amount,
}

#[derive(Args)]
struct BalanceArgs {
    #[command(flatten)]
    token: TokenArg,

    #[arg(long)]
    account: Address,
}

#[derive(Args)]
struct AllowanceQueryArgs {
    #[command(flatten)]
    token: TokenArg,

    #[arg(long)]
    owner: Address,

    #[arg(long)]
    spender: Address,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, &cli.log_format);

    let state = resolve_state_path(cli.state)?;

    match cli.command {
        Commands::Init(args) => hub_init(&state, args),
        Commands::Hub(command) => {
            let exec = Executor::load(&state, SystemClock::new())
                .with_context(|| format!("failed to load hub from {}", state.display()))?;
            run(&exec, &state, command)
        }
    }
}

/// Dispatch a command against a loaded hub.
fn run(exec: &Executor, state: &Path, command: HubCommand) -> Result<()> {
    match command {
        HubCommand::Config => {
            let config = exec.view(|hub, _| hub.config().clone());
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        HubCommand::Tokens => {
            exec.view(|hub, _| {
                for t in hub.tokens() {
                    println!("{}  owner={}  name={}", t.address(), t.owner(), t.name());
                }
            });
            Ok(())
        }
        HubCommand::Signup(args) => {
            let receipt = exec.signup(args.caller, &args.name)?;
            println!("token: {}", receipt.value);
            commit(exec, state, receipt)
        }
        HubCommand::Transfer(args) => {
            let token = resolve_token(exec, args.token.token)?;
            let receipt =
                exec.call_token(args.caller, token, |t, ctx| t.transfer(ctx, args.to, args.value))?;
            commit(exec, state, receipt)
        }
        HubCommand::Approve(args) => {
            let token = resolve_token(exec, args.token.token)?;
            let receipt = exec.call_token(args.caller, token, |t, ctx| {
                t.approve(ctx, args.spender, args.value)
            })?;
            commit(exec, state, receipt)
        }
        HubCommand::IncreaseAllowance(args) => {
            let token = resolve_token(exec, args.token.token)?;
            let receipt = exec.call_token(args.caller, token, |t, ctx| {
                t.increase_allowance(ctx, args.spender, args.value)
            })?;
            commit(exec, state, receipt)
        }
        HubCommand::DecreaseAllowance(args) => {
            let token = resolve_token(exec, args.token.token)?;
            let receipt = exec.call_token(args.caller, token, |t, ctx| {
                t.decrease_allowance(ctx, args.spender, args.value)
            })?;
            commit(exec, state, receipt)
        }
        HubCommand::TransferFrom(args) => {
            let token = resolve_token(exec, args.token.token)?;
            let receipt = exec.call_token(args.caller, token, |t, ctx| {
                t.transfer_from(ctx, args.from, args.to, args.value)
            })?;
            commit(exec, state, receipt)
        }
        HubCommand::Balance(args) => {
            let token = resolve_token(exec, args.token.token)?;
            let balance = exec.view(|hub, now| hub.token(&token)?.balance_of(&args.account, now))?;
            println!("{balance}");
            Ok(())
        }
        HubCommand::Allowance(args) => {
            let token = resolve_token(exec, args.token.token)?;
            let allowance = exec.view(|hub, _| {
                hub.token(&token)
                    .map(|t| t.allowance(&args.owner, &args.spender))
            })?;
            println!("{allowance}");
            Ok(())
        }
        HubCommand::Supply(args) => {
            let token = resolve_token(exec, args.token)?;
            let supply = exec.view(|hub, now| hub.token(&token)?.total_supply(now))?;
            println!("{supply}");
            Ok(())
        }
    }
}

/// Create a fresh hub snapshot from layered settings.
fn hub_init(state: &Path, args: InitArgs) -> Result<()> {
    if state.exists() && !args.force {
        bail!("Hub snapshot already exists: {} (use --force)", state.display());
    }

    let config = HubSettings::load(args.config.as_deref())?.into_hub_config(args.system_owner)?;
    let hub = Hub::new(config)?;
    Executor::new(hub, SystemClock::new())
        .save(state)
        .context("failed to save hub")?;

    info!(path = %state.display(), "hub initialized");
    println!("Hub saved to: {}", state.display());
    Ok(())
}

/// Print the receipt's events and persist the new state.
fn commit<T>(exec: &Executor, state: &Path, receipt: Receipt<T>) -> Result<()> {
    for event in &receipt.events {
        println!("{event}");
    }
    exec.save(state).context("failed to save hub")?;
    Ok(())
}

/// Accept either a ledger handle or the address of a signed-up owner.
fn resolve_token(exec: &Executor, token: Address) -> Result<Address> {
    exec.view(|hub, _| {
        if hub.token(&token).is_ok() {
            Ok(token)
        } else if let Some(handle) = hub.token_of(&token) {
            Ok(handle)
        } else {
            bail!("No currency for {token}")
        }
    })
}

/// Resolve the snapshot path (default: <data dir>/circles/hub.json).
fn resolve_state_path(path: Option<PathBuf>) -> Result<PathBuf> {
    match path {
        Some(p) => Ok(p),
        None => {
            let base = dirs::data_dir().context("Cannot determine data directory")?;
            Ok(base.join("circles").join("hub.json"))
        }
    }
}

/// Initialize tracing subscriber with the given log level and output format.
fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_str));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
