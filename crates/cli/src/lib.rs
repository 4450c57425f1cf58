pub mod commands;

use std::io::Read;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "triad",
    about = "Triad operator CLI",
    long_about = "Inspect Triad configuration, check runtime readiness, and scan agent replies for hand-off markers.",
    after_help = "Examples:\n  triad doctor --json\n  triad config\n  echo \"$REPLY\" | triad scan"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config and language model readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Read an insights agent reply from stdin and report the hand-off scan as JSON")]
    Scan,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Scan => {
            let mut input = String::new();
            match std::io::stdin().read_to_string(&mut input) {
                Ok(_) => commands::scan::run(&input),
                Err(error) => commands::CommandResult::failure(
                    "scan",
                    "stdin",
                    format!("could not read stdin: {error}"),
                    2,
                ),
            }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
