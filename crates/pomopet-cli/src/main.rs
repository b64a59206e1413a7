use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "pomopet", version, about = "Pomopet focus timer CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Preview a pomodoro cycle
    Plan(commands::plan::PlanArgs),
    /// Run a live focus session
    Run(commands::session::RunArgs),
    /// Custom-mode duration slider mapping
    Slider {
        #[command(subcommand)]
        action: commands::slider::SliderAction,
    },
    /// Show the pet and the daily streak
    Pet,
    /// Recent focus sessions
    History(commands::stats::HistoryArgs),
    /// Focus statistics for one day
    Stats(commands::stats::StatsArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// List available ambient sounds
    Sounds,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Plan(args) => commands::plan::run(args),
        Commands::Run(args) => commands::session::run(args),
        Commands::Slider { action } => commands::slider::run(action),
        Commands::Pet => commands::pet::run(),
        Commands::History(args) => commands::stats::history(args),
        Commands::Stats(args) => commands::stats::run(args),
        Commands::Config { action } => commands::config::run(action),
        Commands::Sounds => commands::sounds::run(),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
