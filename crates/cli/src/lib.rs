pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "kunan",
    about = "Kunan ordering CLI",
    long_about = "Quote delivery requests, run an interactive order session, and inspect runtime readiness.",
    after_help = "Examples:\n  kunan quote Llevar llaves a 10 cuadras en Miraflores\n  kunan session\n  kunan doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Quote a single free-text request and print the result as JSON")]
    Quote {
        #[arg(required = true, num_args = 1.., help = "Request text, e.g. \"Comprar almuerzo en Barranco\"")]
        text: Vec<String>,
    },
    #[command(about = "Run an interactive order session: request, quote, payment, confirmation")]
    Session,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config and report completion and order store readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Quote { text } => commands::quote::run(&text.join(" ")),
        Command::Session => commands::session::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
