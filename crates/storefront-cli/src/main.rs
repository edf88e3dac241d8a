//! Storefront - command line front end for storefront accounts.
//!
//! Sign up, log in and manage the account profile against the storefront
//! backend. The session is kept between runs, so `login` once and the
//! `profile` commands reuse the stored token.

mod views;

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use storefront_core::{AccountClient, Config};

use views::ConsoleNotifier;

#[derive(Debug, Parser)]
#[command(name = "storefront", version, about = "Manage your storefront account")]
struct Cli {
    /// Backend origin, e.g. http://localhost:8000 (overrides config and STOREFRONT_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a new account
    Signup {
        #[arg(long)]
        email: String,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Log in and store the session
    Login {
        #[arg(long)]
        email: String,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Clear the stored session
    Logout,
    /// Show whether a session is stored
    Status,
    /// View or edit the account profile
    #[command(subcommand)]
    Profile(ProfileCommand),
}

#[derive(Debug, Subcommand)]
enum ProfileCommand {
    /// Show the profile
    Show,
    /// Save date of birth and gender
    Update {
        /// Date of birth as YYYY-MM-DD
        #[arg(long)]
        dob: String,
        #[arg(long)]
        gender: String,
    },
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(ref url) = cli.api_url {
        config.override_api_url(url);
    }
    info!(api = %config.api_base_url, backend = ?config.session_backend, "storefront starting");

    let session = config.open_session_store()?;
    let client = AccountClient::from_config(&config, session)?
        .with_notifier(Arc::new(ConsoleNotifier));

    let code = match cli.command {
        Command::Signup { email, password } => views::signup(&client, &email, password).await?,
        Command::Login { email, password } => views::login(&client, &email, password).await?,
        Command::Logout => views::logout(&client),
        Command::Status => views::status(&client),
        Command::Profile(ProfileCommand::Show) => views::show_profile(&client).await,
        Command::Profile(ProfileCommand::Update { dob, gender }) => {
            views::update_profile(&client, &dob, &gender).await
        }
    };

    debug!("storefront finished");
    Ok(code)
}
