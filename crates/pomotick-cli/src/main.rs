use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod render;
mod signal;

#[derive(Parser)]
#[command(name = "pomotick", version, about = "Countdown and Pomodoro timer")]
struct Cli {
    #[command(flatten)]
    opts: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

/// Flags shared by every timer command.
#[derive(clap::Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Print snapshots and events as JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    /// Do not show desktop notifications or ring the bell
    #[arg(long, global = true)]
    pub no_notify: bool,

    /// Tick period in milliseconds
    #[arg(long, global = true, default_value_t = 1000, hide = true)]
    pub tick_ms: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Count down once from MINUTES:SECONDS
    Countdown(commands::timer::CountdownArgs),
    /// Cycle work and break intervals
    Pomodoro(commands::timer::PomodoroArgs),
    /// Control a timer with commands typed on stdin
    Interactive(commands::timer::InteractiveArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("POMOTICK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Countdown(args) => commands::timer::countdown(args, &cli.opts).await,
        Commands::Pomodoro(args) => commands::timer::pomodoro(args, &cli.opts).await,
        Commands::Interactive(args) => commands::timer::interactive(args, &cli.opts).await,
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
