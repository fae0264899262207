//! Dietary Admin CLI
//!
//! Bootstrap tool for staff accounts. It works directly on the database and
//! does not need a login session.
//!
//! # Usage
//!
//! ```bash
//! dietary-admin user add jdoe --name "Jane Doe" --role dietitian
//! dietary-admin user list
//! dietary-admin user reset-password jdoe
//! dietary-admin user remove jdoe
//! ```
//!
//! New and reset accounts get a temporary password that must be changed at
//! the next `dietary login`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use dietary::config::Config;
use dietary::models::Role;
use dietary::Dietary;

#[derive(Parser)]
#[command(name = "dietary-admin")]
#[command(version)]
#[command(about = "Dietary administration tool")]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage users
    User(UserCommand),
}

#[derive(Args)]
struct UserCommand {
    #[command(subcommand)]
    command: UserSubcommand,
}

#[derive(Subcommand)]
enum UserSubcommand {
    /// Add a new user
    Add {
        /// Login name
        username: String,
        /// User's display name
        #[arg(long, short)]
        name: Option<String>,
        /// Role (admin, dietitian, staff)
        #[arg(long, short, default_value = "staff")]
        role: Role,
        /// Initial password; a temporary one is generated when omitted
        #[arg(long, short)]
        password: Option<String>,
    },
    /// List all users
    List,
    /// Remove a user
    Remove {
        /// Login name
        username: String,
    },
    /// Issue a temporary password
    ResetPassword {
        /// Login name
        username: String,
    },
}

async fn add_user(
    dietary: &Dietary,
    username: String,
    name: Option<String>,
    role: Role,
    password: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let generated = password.is_none();
    let (user, password) = dietary
        .users
        .create_user(&username, name.as_deref().unwrap_or(""), role, password)
        .await?;

    println!("Added user: {}", user.username);
    println!("  Role: {}", user.role);
    if !user.full_name.is_empty() {
        println!("  Name: {}", user.full_name);
    }
    if generated {
        println!("  Temporary password: {}", password);
    }
    println!("  The password must be changed at first login.");

    Ok(())
}

async fn list_users(dietary: &Dietary) -> Result<(), Box<dyn std::error::Error>> {
    let users = dietary.users.list_users().await?;

    if users.is_empty() {
        println!("No users registered.");
        return Ok(());
    }

    println!("{:<20} {:<30} {:<10} {:<8}", "USERNAME", "NAME", "ROLE", "STATUS");
    println!("{}", "-".repeat(70));

    for user in &users {
        println!(
            "{:<20} {:<30} {:<10} {:<8}",
            user.username,
            user.full_name,
            user.role.to_string(),
            if user.must_change_password {
                "reset"
            } else {
                "active"
            }
        );
    }

    println!();
    println!("Total: {} user(s)", users.len());

    Ok(())
}

async fn remove_user(dietary: &Dietary, username: String) -> Result<(), Box<dyn std::error::Error>> {
    dietary.users.delete_user(&username).await?;
    println!("Removed user: {}", username);
    Ok(())
}

async fn reset_password(
    dietary: &Dietary,
    username: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let password = dietary.users.reset_password(&username).await?;
    println!("Reset password for: {}", username);
    println!("  Temporary password: {}", password);
    Ok(())
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load(cli.config)?;
    let dietary = Dietary::open(&config.database_path.value, config.write_workers.value).await?;

    let result = match cli.command {
        Commands::User(user_cmd) => match user_cmd.command {
            UserSubcommand::Add {
                username,
                name,
                role,
                password,
            } => add_user(&dietary, username, name, role, password).await,
            UserSubcommand::List => list_users(&dietary).await,
            UserSubcommand::Remove { username } => remove_user(&dietary, username).await,
            UserSubcommand::ResetPassword { username } => reset_password(&dietary, username).await,
        },
    };

    dietary.close().await;
    result
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dietary=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
