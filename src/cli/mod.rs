pub mod auth;
pub mod browse;
pub mod contributions;
pub mod dashboard;
pub mod demo;
pub mod import;
pub mod init;
pub mod list;
pub mod members;
pub mod serve;
pub mod status;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::auth::{mock::MockAuth, require_user};
use crate::db::Store;
use crate::error::Result;
use crate::models::User;
use crate::settings::db_path;

pub(crate) fn open_store() -> Result<Store> {
    Store::open(&db_path())
}

/// Gate for commands behind the login screen.
pub(crate) fn require_login(store: &Store) -> Result<User> {
    let user = require_user(&MockAuth::new(store))?;
    tracing::debug!(email = %user.email, "authenticated");
    Ok(user)
}

#[derive(Parser)]
#[command(
    name = "tently",
    version,
    about = "Back office for cooperative societies: members, contributions and the dashboard."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up Tently: choose a data directory and initialize the database.
    Init {
        /// Path for Tently data (default: ~/Documents/tently)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Seed sample members, contributions and transactions.
    Demo,
    /// Manage members.
    Members {
        #[command(subcommand)]
        command: MembersCommands,
    },
    /// Review contributions.
    Contributions {
        #[command(subcommand)]
        command: ContributionsCommands,
    },
    /// Headline figures, monthly contributions and recent transactions.
    Dashboard {
        #[command(flatten)]
        list: ListArgs,
    },
    /// Browse a list interactively.
    Browse {
        #[arg(value_enum)]
        target: BrowseTarget,
    },
    /// Import members from a CSV or XLSX file.
    Import {
        /// Path to the CSV or XLSX file
        file: String,
    },
    /// Create an account. A verification code is printed in place of an email.
    Signup {
        #[arg(long = "first-name")]
        first_name: String,
        #[arg(long = "last-name")]
        last_name: String,
        #[arg(long)]
        email: String,
        #[command(flatten)]
        password: PasswordArgs,
    },
    /// Confirm a 6-digit verification code.
    VerifyOtp {
        code: String,
    },
    /// Sign in with email and password.
    Login {
        #[arg(long)]
        email: String,
        #[command(flatten)]
        password: PasswordArgs,
    },
    /// Sign out.
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// Request a password reset code.
    ForgotPassword {
        #[arg(long)]
        email: String,
    },
    /// Set a new password using a reset code.
    ResetPassword {
        #[arg(long)]
        code: String,
        #[command(flatten)]
        password: PasswordArgs,
    },
    /// Run the Google sign-in server for the web front end.
    Serve {
        /// Port to listen on (default: $PORT or 3001)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Show settings, database location and record counts.
    Status,
    /// Print shell completions.
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub enum MembersCommands {
    /// List members.
    List {
        #[command(flatten)]
        list: ListArgs,
    },
    /// Add a member.
    Add {
        #[command(flatten)]
        fields: MemberFields,
    },
    /// Change a member's details.
    Edit {
        /// Member ID
        id: String,
        #[command(flatten)]
        fields: MemberFields,
    },
    /// Show one member.
    Show {
        /// Member ID
        id: String,
    },
    /// Invite someone to join by email. Prints the share link.
    Invite {
        #[arg(long)]
        email: String,
    },
    /// Set the status of one or more members.
    SetStatus {
        /// active, deactivated, pending or new
        #[arg(long)]
        status: String,
        /// Member IDs
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum ContributionsCommands {
    /// List contributions.
    List {
        #[command(flatten)]
        list: ListArgs,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum BrowseTarget {
    Members,
    Contributions,
    Transactions,
}

/// Search, filter, sort and page options shared by every list.
#[derive(Args, Debug, Default, Clone)]
pub struct ListArgs {
    /// Match against name or ID (case-insensitive)
    #[arg(long)]
    pub search: Option<String>,
    /// Turn on a filter toggle by id; repeatable. Replaces the default filters.
    #[arg(long = "filter")]
    pub filters: Vec<String>,
    /// Show every record regardless of category
    #[arg(long, conflicts_with = "filters")]
    pub all: bool,
    /// Sort key (name, id, date, amount, status, role, type, purpose)
    #[arg(long)]
    pub sort: Option<String>,
    /// Sort descending
    #[arg(long)]
    pub desc: bool,
    /// Earliest date, YYYY-MM-DD
    #[arg(long)]
    pub from: Option<String>,
    /// Latest date, YYYY-MM-DD
    #[arg(long)]
    pub to: Option<String>,
    /// Date preset: today, yesterday, this-week, last-week, last-month
    #[arg(long, conflicts_with_all = ["from", "to"])]
    pub range: Option<String>,
    /// Page to show
    #[arg(long, default_value_t = 1)]
    pub page: usize,
    /// Rows per page (5, 10, 20, 50 or 100)
    #[arg(long = "page-size")]
    pub page_size: Option<usize>,
}

#[derive(Args, Debug, Default, Clone)]
pub struct MemberFields {
    #[arg(long = "first-name")]
    pub first_name: Option<String>,
    #[arg(long = "last-name")]
    pub last_name: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub role: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub occupation: Option<String>,
    #[arg(long)]
    pub gender: Option<String>,
    #[arg(long)]
    pub country: Option<String>,
    #[arg(long)]
    pub state: Option<String>,
    /// active, deactivated, pending or new
    #[arg(long)]
    pub status: Option<String>,
}

#[derive(Args, Debug, Default, Clone)]
pub struct PasswordArgs {
    /// Read the password from the first line of stdin instead of prompting
    #[arg(long = "password-stdin")]
    pub password_stdin: bool,
}
