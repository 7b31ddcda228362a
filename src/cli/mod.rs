//! CLI interface for Donorlink

pub mod commands;
mod output;

pub use output::*;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "donorlink")]
#[command(author = "Krakaw")]
#[command(version = "0.3.0")]
#[command(about = "Blood donation platform client", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Initialize a new donorlink.toml configuration file
    Init,

    /// Register a new donor account
    Register {
        /// Email address to sign in with
        #[arg(short, long)]
        email: String,

        /// Full name
        #[arg(short, long)]
        name: String,

        /// Blood group, e.g. A+ or O-
        #[arg(short, long)]
        blood_group: String,

        #[arg(short, long)]
        district: String,

        #[arg(short, long)]
        upazila: String,

        /// Avatar image URL
        #[arg(long)]
        avatar: Option<String>,

        /// Password (prompted for when omitted)
        #[arg(long, env = "DONORLINK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Sign in
    Login {
        /// Email address (not needed with --google)
        #[arg(short, long, required_unless_present = "google")]
        email: Option<String>,

        /// Sign in through the federated provider
        #[arg(long)]
        google: bool,

        /// Password (prompted for when omitted)
        #[arg(long, env = "DONORLINK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Sign out and forget the access token
    Logout,

    /// Show the signed-in user
    Whoami {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show the role of the signed-in user and their dashboard menu
    Role,

    /// List application routes and who may open them
    Routes {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Open a route through its guard
    Visit {
        /// Path, e.g. /dashboard/all-users
        path: String,
    },

    /// Manage donation requests
    Requests {
        #[command(subcommand)]
        action: RequestsAction,
    },

    /// Manage users (admin)
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },

    /// Funding history
    Funding {
        #[command(subcommand)]
        action: FundingAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum RequestsAction {
    /// List donation requests
    List {
        /// Only requests with this status
        #[arg(short, long)]
        status: Option<String>,

        /// Only requests created by the signed-in user
        #[arg(short, long)]
        mine: bool,

        #[arg(short, long, default_value = "1")]
        page: u32,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show one donation request
    Show {
        id: String,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Change the status of a request; `inprogress` claims it for the signed-in user
    Status {
        id: String,

        /// pending, inprogress, done or canceled
        status: String,
    },

    /// Delete a donation request
    Delete {
        id: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum UsersAction {
    /// List users
    List {
        /// active or blocked
        #[arg(short, long)]
        status: Option<String>,

        #[arg(short, long, default_value = "1")]
        page: u32,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },
}

#[derive(Debug, Subcommand)]
pub enum FundingAction {
    /// List received funding
    List {
        #[arg(short, long, default_value = "1")]
        page: u32,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}
