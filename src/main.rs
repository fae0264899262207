use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod session;

use commands::{ConfigCommand, ItemCommand, LoginCommand, MealCommand, OrderCommand, PatientCommand};
use dietary::config::Config;
use dietary::Dietary;

#[derive(Parser)]
#[command(name = "dietary")]
#[command(version)]
#[command(about = "Hospital dietary management: patients, meal selections and orders", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and remember the user for later commands
    Login(LoginCommand),

    /// Forget the logged-in user
    Logout,

    /// Manage configuration
    Config(ConfigCommand),

    #[command(flatten)]
    Ward(WardCommand),
}

/// Commands that need a logged-in user.
#[derive(Subcommand)]
enum WardCommand {
    /// Admit, edit and discharge patients
    Patient(PatientCommand),

    /// Edit meal selections and completion
    Meal(MealCommand),

    /// Manage the item catalog
    Item(ItemCommand),

    /// Create and finalize kitchen orders
    Order(OrderCommand),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dietary=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    let config = Config::load(cli.config)?;

    match cli.command {
        Some(Commands::Config(cmd)) => cmd.run(&config),
        Some(Commands::Logout) => commands::logout(&config),
        Some(Commands::Login(cmd)) => {
            let dietary = open(&config).await?;
            let result = cmd.run(&dietary, &config).await;
            dietary.close().await;
            result
        }
        Some(Commands::Ward(cmd)) => {
            let dietary = open(&config).await?;
            let result = run_ward(cmd, &dietary, &config).await;
            dietary.close().await;
            result
        }
        None => {
            println!("Use --help to see available commands");
            Ok(())
        }
    }
}

async fn open(config: &Config) -> Result<Dietary, Box<dyn std::error::Error>> {
    tracing::debug!(
        database = %config.database_path.value.display(),
        workers = config.write_workers.value,
        "opening database"
    );
    Ok(Dietary::open(&config.database_path.value, config.write_workers.value).await?)
}

async fn run_ward(
    command: WardCommand,
    dietary: &Dietary,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let user = session::active_user(dietary, &config.session_path.value).await?;

    match command {
        WardCommand::Patient(cmd) => cmd.run(dietary).await,
        WardCommand::Meal(cmd) => cmd.run(dietary).await,
        WardCommand::Item(cmd) => cmd.run(dietary).await,
        WardCommand::Order(cmd) => cmd.run(dietary, &user).await,
    }
}
