//! Staybook - hotel and restaurant booking from the terminal.
//!
//! Every API call carries the stored access token. When the token expires,
//! the session is renewed once for all in-flight requests and the requests
//! are replayed transparently.

mod auth;
mod cli;
mod client;
mod config;
mod error;
mod search;

use chrono::Local;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::auth::RegisterForm;
use crate::cli::{AppContext, AuthCommands, Cli, Commands, SearchCommands};
use crate::config::load_config;
use crate::config::settings::env;
use crate::error::Result;
use crate::search::{Guests, HotelSearch, RestaurantSearch, SearchRequest};

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(env::LOG_LEVEL)
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    // Run the command
    if let Err(e) = run(cli).await {
        tracing::debug!(
            reauth = e.requires_reauth(),
            retriable = e.is_retriable(),
            "Command failed"
        );
        eprintln!("Error: {e}");
        if e.is_retriable() {
            eprintln!("This is usually temporary; try again in a moment.");
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    if let Commands::Completions { shell } = cli.command {
        return cli::commands::handle_completions(shell);
    }

    let config = load_config(cli.config.as_deref())?;
    let ctx = AppContext::open(config, cli.command.surface())?;

    match cli.command {
        Commands::Auth { command } => match command {
            AuthCommands::Login { email, password } => {
                cli::commands::handle_login(&ctx, email, password).await
            }
            AuthCommands::Register {
                first_name,
                last_name,
                email,
                password,
                confirm_password,
            } => {
                let form = RegisterForm {
                    first_name,
                    last_name,
                    email,
                    password,
                    confirm_password,
                };
                cli::commands::handle_register(&ctx, form).await
            }
            AuthCommands::Logout => cli::commands::handle_logout(&ctx).await,
            AuthCommands::Status => cli::commands::handle_status(&ctx),
        },
        Commands::Search { command } => {
            let request = match command {
                SearchCommands::Hotels {
                    destination,
                    checkin,
                    checkout,
                    adults,
                    children,
                    rooms,
                    pets,
                } => SearchRequest::Hotels(HotelSearch {
                    destination,
                    check_in: checkin,
                    check_out: checkout,
                    guests: Guests {
                        adults,
                        children,
                        rooms,
                        pets,
                    },
                }),
                SearchCommands::Restaurants {
                    destination,
                    date,
                    party_size,
                } => SearchRequest::Restaurants(RestaurantSearch {
                    destination,
                    date: Some(date.unwrap_or_else(|| Local::now().date_naive())),
                    party_size,
                }),
            };
            cli::commands::handle_search(&ctx, &request).await
        }
        Commands::Completions { .. } => Ok(()),
    }
}
