use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use storedesk_business::users::{RoleFilter, SortKey, StatusFilter, UserRole, UserStatus};

#[derive(Parser)]
#[command(name = "storedesk")]
#[command(about = "Manage storefront users from the terminal", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Backend origin, without the `/api` suffix
    #[arg(long, global = true, env = "STOREDESK_API_BASE_URL")]
    pub api_url: Option<String>,

    /// Bearer token sent with every request
    #[arg(long, global = true, env = "STOREDESK_AUTH_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Show timing/latency information
    #[arg(long, global = true)]
    pub timing: bool,

    /// Enable verbose debug output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Work with user accounts
    #[command(subcommand)]
    Users(UsersCommand),
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum UsersCommand {
    /// List users as a table
    List {
        #[command(flatten)]
        view: ViewArgs,

        /// Print the rows as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show every field of one user
    Show {
        id: String,

        #[arg(long)]
        json: bool,
    },
    /// Summary counts (total, active, customers, admins)
    Stats,
    /// Change a user's status
    SetStatus {
        id: String,
        /// Active, Inactive or Suspended
        status: UserStatus,
    },
    /// Change a user's role
    SetRole {
        id: String,
        /// admin, or user (alias: customer)
        role: UserRole,
    },
    /// Delete a user after confirmation
    Delete {
        id: String,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Write the listed users to `users_export_<date>.csv`
    Export {
        #[command(flatten)]
        view: ViewArgs,

        /// Directory to write into
        #[arg(long, short = 'o', default_value = ".")]
        out: PathBuf,
    },
}

/// Filters and ordering shared by `list` and `export`.
#[derive(Args, Debug, Clone, Default)]
pub struct ViewArgs {
    /// Case-insensitive match on name, email, phone or id
    #[arg(long, short = 's', default_value = "")]
    pub search: String,

    /// All, Active, Inactive or Suspended
    #[arg(long, default_value = "All")]
    pub status: StatusFilter,

    /// All, Admin or Customer
    #[arg(long, default_value = "All")]
    pub role: RoleFilter,

    /// Column to sort by, e.g. name, createdAt, orderCount
    #[arg(long)]
    pub sort: Option<SortKey>,

    /// Sort descending
    #[arg(long, requires = "sort")]
    pub desc: bool,
}
