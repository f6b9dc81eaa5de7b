use crate::commands::{
    run_form_info, run_form_prefill, run_form_provision, run_notify_latest, run_profile,
    run_roles_check, run_roles_divisions, run_roles_list, PrefillArgs, ProfileArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use faculty_roles::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Faculty Roles Dashboard",
    about = "Serve and operate the faculty roles recruiting dashboard",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Inspect the open faculty roles sheet
    Roles {
        #[command(subcommand)]
        command: RolesCommand,
    },
    /// Manage the role interest form
    Form {
        #[command(subcommand)]
        command: FormCommand,
    },
    /// Resolve the profile used to prefill the form for an email address
    Profile(ProfileArgs),
    /// Send HR notifications for form submissions
    Notify {
        #[command(subcommand)]
        command: NotifyCommand,
    },
}

#[derive(Subcommand, Debug)]
enum RolesCommand {
    /// Print the open roles as JSON
    List,
    /// Print the distinct divisions with open roles
    Divisions,
    /// Summarise the roles sheet for a quick data check
    Check,
}

#[derive(Subcommand, Debug)]
enum FormCommand {
    /// Create or refresh the interest form from the current open roles
    Provision,
    /// Show form links and response spreadsheet status
    Info,
    /// Build a prefilled form link for one role and respondent
    Prefill(PrefillArgs),
}

#[derive(Subcommand, Debug)]
enum NotifyCommand {
    /// Email HR about the most recent response row
    Latest,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Roles { command } => match command {
            RolesCommand::List => run_roles_list().await,
            RolesCommand::Divisions => run_roles_divisions().await,
            RolesCommand::Check => run_roles_check().await,
        },
        Command::Form { command } => match command {
            FormCommand::Provision => run_form_provision().await,
            FormCommand::Info => run_form_info().await,
            FormCommand::Prefill(args) => run_form_prefill(args).await,
        },
        Command::Profile(args) => run_profile(args).await,
        Command::Notify {
            command: NotifyCommand::Latest,
        } => run_notify_latest().await,
    }
}
