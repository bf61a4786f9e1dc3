mod auth;
mod browser;
mod cli;
mod db;
mod error;
mod fmt;
mod importer;
mod invites;
mod members;
mod metrics;
mod models;
mod query;
mod server;
mod settings;
mod tui;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, ContributionsCommands, MembersCommands};

fn init_tracing(command: Option<&Commands>) {
    let default = match command {
        Some(Commands::Serve { .. }) => "info",
        _ => "warn",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.command.as_ref());

    let result = match cli.command {
        None | Some(Commands::Status) => cli::status::run(),
        Some(Commands::Init { data_dir }) => cli::init::run(data_dir),
        Some(Commands::Demo) => cli::demo::run(),
        Some(Commands::Members { command }) => match command {
            MembersCommands::List { list } => cli::members::list(&list),
            MembersCommands::Add { fields } => cli::members::add(&fields),
            MembersCommands::Edit { id, fields } => cli::members::edit(&id, &fields),
            MembersCommands::Show { id } => cli::members::show(&id),
            MembersCommands::Invite { email } => cli::members::invite(&email),
            MembersCommands::SetStatus { status, ids } => cli::members::set_status(&status, &ids),
        },
        Some(Commands::Contributions { command }) => match command {
            ContributionsCommands::List { list } => cli::contributions::list(&list),
        },
        Some(Commands::Dashboard { list }) => cli::dashboard::run(&list),
        Some(Commands::Browse { target }) => cli::browse::run(target),
        Some(Commands::Import { file }) => cli::import::run(&file),
        Some(Commands::Signup {
            first_name,
            last_name,
            email,
            password,
        }) => cli::auth::signup(&first_name, &last_name, &email, &password),
        Some(Commands::VerifyOtp { code }) => cli::auth::verify_otp(&code),
        Some(Commands::Login { email, password }) => cli::auth::login(&email, &password),
        Some(Commands::Logout) => cli::auth::logout(),
        Some(Commands::Whoami) => cli::auth::whoami(),
        Some(Commands::ForgotPassword { email }) => cli::auth::forgot_password(&email),
        Some(Commands::ResetPassword { code, password }) => {
            cli::auth::reset_password(&code, &password)
        }
        Some(Commands::Serve { port }) => cli::serve::run(port),
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "tently", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
