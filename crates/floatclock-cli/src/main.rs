use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

/// Env var consulted before `RUST_LOG`.
const LOG_ENV: &str = "FLOATCLOCK_LOG";

#[derive(Parser)]
#[command(name = "floatclock-cli", version, about = "floatclock timer on the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the timers in real time, reading commands from stdin
    Run(commands::run::RunArgs),
    /// Print the state a fresh start would show, as JSON
    Status,
    /// Settings management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run(args) => commands::run::run(args),
        Commands::Status => commands::status::run(),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
