//! ledchain — drive a chain of MAX7219 seven-segment modules.
//!
//! # Usage
//!
//! ```text
//! ledchain set <module> <number>
//! ledchain clear <module>
//! ledchain brightness <module> <0-15>
//! ledchain on|off <module>
//! ledchain reset
//! ledchain sync
//! ledchain status [--json]
//! ledchain modules <count>
//! ```
//!
//! Modules are numbered from 1. Every command that changes the display loads
//! the saved state, applies the change, sends the whole chain, then saves.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    brightness::BrightnessArgs, clear::ClearArgs, modules::ModulesArgs, power::PowerArgs,
    reset::ResetArgs, set::SetArgs, status::StatusArgs, sync::SyncArgs, GlobalOpts,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "ledchain",
    version,
    about = "Drive a daisy-chain of MAX7219 seven-segment displays",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show a number on a module.
    Set(SetArgs),

    /// Blank a module, keeping its last number.
    Clear(ClearArgs),

    /// Set a module's intensity (0-15).
    Brightness(BrightnessArgs),

    /// Power a module up.
    On(PowerArgs),

    /// Put a module into shutdown.
    Off(PowerArgs),

    /// Return every module to its defaults.
    Reset(ResetArgs),

    /// Resend the saved state of every module.
    Sync(SyncArgs),

    /// Show the saved state of every module.
    Status(StatusArgs),

    /// Record the number of chained modules.
    Modules(ModulesArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    let global = cli.global;
    match cli.command {
        Commands::Set(args) => args.run(&global),
        Commands::Clear(args) => args.run(&global),
        Commands::Brightness(args) => args.run(&global),
        Commands::On(args) => args.run(&global, true),
        Commands::Off(args) => args.run(&global, false),
        Commands::Reset(args) => args.run(&global),
        Commands::Sync(args) => args.run(&global),
        Commands::Status(args) => args.run(),
        Commands::Modules(args) => args.run(),
    }
}

/// `RUST_LOG` wins; otherwise `warn`, or `debug` with `-v`.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
