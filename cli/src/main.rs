//! Command-line front end for the sipgate client.

mod commands;
mod config;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use phonenumber::country;
use sipgate::{Connection, Credentials, SipgateError};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "sipgate", version, about = "Place calls and send texts through sipgate")]
struct Cli {
    /// Account configuration file.
    #[arg(short = 'f', long = "file", value_name = "FILE", default_value = config::DEFAULT_CONFIG_FILE)]
    file: PathBuf,

    /// Account user, overrides the configuration file.
    #[arg(long, env = "SIPGATE_USER")]
    user: Option<String>,

    /// Account password, overrides the configuration file.
    #[arg(long, env = "SIPGATE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Region for numbers without a country prefix, e.g. DE.
    #[arg(long, value_name = "CC", value_parser = parse_region)]
    region: Option<country::Id>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Initiate a voice call from an endpoint to NUMBER.
    Call {
        number: String,
        /// Endpoint name or SIP URI. Defaults to the account's default endpoint.
        #[arg(long)]
        endpoint: Option<String>,
    },
    /// Send a text message. Reads the message from stdin unless given.
    Sms {
        number: String,
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Show the account balance.
    Balance,
    /// List the account's endpoints.
    Endpoints {
        /// Only endpoints supporting this type of service (voice, fax, text).
        #[arg(long)]
        tos: Option<String>,
    },
    /// Print the account greeting as JSON.
    Greeting,
    /// Show the state of a session.
    Status { session_id: String },
    /// Close a session.
    Hangup { session_id: String },
}

fn parse_region(input: &str) -> Result<country::Id, String> {
    input
        .trim()
        .to_ascii_uppercase()
        .parse::<country::Id>()
        .map_err(|_| format!("unknown region code: {input}"))
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "sipgate=debug,sipgate_cli=debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err, &cli.file);
            ExitCode::FAILURE
        }
    }
}

fn report(err: &anyhow::Error, config_path: &Path) {
    match err.downcast_ref::<SipgateError>() {
        Some(sipgate_err) if sipgate_err.is_auth_error() => {
            eprintln!(
                "Could not authenticate with sipgate server. \
                 Please adjust your account settings in '{}'",
                config_path.display()
            );
        }
        _ => eprintln!("error: {err:#}"),
    }
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let account = config::resolve_account(&cli.file, cli.user.clone(), cli.password.clone())?;
    let credentials = Credentials::new(account.user, account.password)?;
    let connection = Connection::builder(credentials).connect().await?;

    match &cli.command {
        Command::Call { number, endpoint } => {
            let number = commands::dial_number(number, cli.region)?;
            commands::call(&connection, &number, endpoint.as_deref()).await
        }
        Command::Sms { number, message } => {
            let number = commands::dial_number(number, cli.region)?;
            commands::sms(&connection, &number, message.clone()).await
        }
        Command::Balance => commands::balance(&connection).await,
        Command::Endpoints { tos } => commands::endpoints(&connection, tos.as_deref()),
        Command::Greeting => commands::greeting(&connection).await,
        Command::Status { session_id } => commands::status(&connection, session_id).await,
        Command::Hangup { session_id } => commands::hangup(&connection, session_id).await,
    }
}
