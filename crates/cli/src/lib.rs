pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "ratedesk",
    about = "Ratedesk operator CLI",
    long_about = "Manage the rate table, inspect configuration, and chat with the rate assistant.",
    after_help = "Examples:\n  \
        ratedesk seed\n  \
        ratedesk ask \"germany cc ivr local mobile\"\n  \
        ratedesk ask --session ops\n  \
        ratedesk doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic demo rate table into an empty database")]
    Seed,
    #[command(
        about = "Ask the rate assistant; without a message, read one turn per stdin line"
    )]
    Ask {
        #[arg(help = "Message for a single turn")]
        message: Option<String>,
        #[arg(long, help = "Session id the turns belong to")]
        session: Option<String>,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, DB connectivity, and rate table readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Ask { message: Some(message), session } => {
            commands::ask::run(&message, session.as_deref())
        }
        Command::Ask { message: None, session } => {
            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            commands::ask::run_interactive(stdin.lock(), stdout.lock(), session.as_deref())
        }
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    if !result.output.is_empty() {
        println!("{}", result.output);
    }
    ExitCode::from(result.exit_code)
}
