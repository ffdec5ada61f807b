use clap::{CommandFactory, Parser, Subcommand};
use ratecast::cli::exit::exit_code_for;
use ratecast::core::log::init_logging;
use std::process::ExitCode;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for ratecast::AppCommand {
    fn from(cmd: Commands) -> ratecast::AppCommand {
        match cmd {
            Commands::Rate { base, quote } => ratecast::AppCommand::Rate { base, quote },
            Commands::Subscribe { email } => ratecast::AppCommand::Subscribe { email },
            Commands::Subscribers => ratecast::AppCommand::Subscribers,
            Commands::SendEmails => ratecast::AppCommand::SendEmails,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display the current rate
    Rate {
        /// Asset to price, defaults to the configured one
        #[arg(long)]
        base: Option<String>,
        /// Currency to express the price in, defaults to the configured one
        #[arg(long)]
        quote: Option<String>,
    },
    /// Subscribe an email address to rate notifications
    Subscribe { email: String },
    /// List subscribed email addresses
    Subscribers,
    /// Send the current rate to every subscriber
    SendEmails,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => ratecast::cli::setup::setup().map(|()| ExitCode::SUCCESS),
        Some(cmd) => ratecast::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => Cli::command()
            .print_help()
            .map(|()| ExitCode::SUCCESS)
            .map_err(Into::into),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Application failed");
            exit_code_for(&e)
        }
    }
}
