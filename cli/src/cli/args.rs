//! Command-line argument parsing.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};

/// Book hotels and restaurants from the terminal.
#[derive(Parser, Debug)]
#[command(name = "staybook")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Path to an alternative configuration file.
    #[arg(long, global = true, env = "STAYBOOK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage your account session.
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },

    /// Search hotels or restaurants.
    Search {
        #[command(subcommand)]
        command: SearchCommands,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: ShellType,
    },
}

impl Commands {
    /// The surface this command stands for when a session ends mid-command.
    #[must_use]
    pub const fn surface(&self) -> &'static str {
        match self {
            Self::Auth { command } => match command {
                AuthCommands::Login { .. } => "/login",
                AuthCommands::Register { .. } => "/register",
                AuthCommands::Logout | AuthCommands::Status => "/account",
            },
            Self::Search { command } => match command {
                SearchCommands::Hotels { .. } => "/hotels",
                SearchCommands::Restaurants { .. } => "/restaurants",
            },
            Self::Completions { .. } => "/",
        }
    }
}

/// Supported shell types for completions.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ShellType {
    Bash,
    Zsh,
    Fish,
}

/// Authentication subcommands.
#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Sign in with email and password.
    Login {
        /// Account email.
        #[arg(short, long)]
        email: String,

        /// Account password.
        #[arg(short, long, env = "STAYBOOK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account and sign in.
    Register {
        /// First name.
        #[arg(long)]
        first_name: String,

        /// Last name.
        #[arg(long)]
        last_name: String,

        /// Account email.
        #[arg(short, long)]
        email: String,

        /// Account password.
        #[arg(short, long, env = "STAYBOOK_PASSWORD", hide_env_values = true)]
        password: String,

        /// Password again.
        #[arg(long)]
        confirm_password: String,
    },

    /// Sign out and remove the stored session.
    Logout,

    /// Show current session status.
    Status,
}

/// Search subcommands.
#[derive(Subcommand, Debug)]
pub enum SearchCommands {
    /// Find hotels for a stay.
    Hotels {
        /// City to stay in.
        destination: String,

        /// Check-in date (YYYY-MM-DD).
        #[arg(long)]
        checkin: Option<NaiveDate>,

        /// Check-out date (YYYY-MM-DD).
        #[arg(long)]
        checkout: Option<NaiveDate>,

        /// Number of adults.
        #[arg(long, default_value_t = 2)]
        adults: u32,

        /// Number of children.
        #[arg(long, default_value_t = 0)]
        children: u32,

        /// Number of rooms.
        #[arg(long, default_value_t = 1)]
        rooms: u32,

        /// Travelling with pets.
        #[arg(long)]
        pets: bool,
    },

    /// Find restaurants for a day.
    Restaurants {
        /// City to dine in.
        destination: String,

        /// Date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Number of people.
        #[arg(long, default_value_t = 2)]
        party_size: u32,
    },
}
