pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use commands::invoke::{InvokeArgs, InvokeKind};

#[derive(Debug, Parser)]
#[command(
    name = "shoplist",
    about = "Shoplist operator CLI",
    long_about = "Inspect configuration, check backend readiness, apply migrations, and replay single skill requests.",
    after_help = "Examples:\n  shoplist doctor --json\n  shoplist config\n  shoplist invoke intent --intent AddItemIntent --item milk --launched"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending to-do store migrations and return structured status output")]
    Migrate,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config and check that the selected list backend answers")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Route one request through the skill and print the response envelope")]
    Invoke {
        #[arg(value_enum, help = "Request type to send")]
        kind: InvokeKind,
        #[arg(long, help = "Intent name, required for `intent`")]
        intent: Option<String>,
        #[arg(long, help = "Value for the `item` slot")]
        item: Option<String>,
        #[arg(long, help = "Treat the session as already launched")]
        launched: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Invoke { kind, intent, item, launched } => {
            commands::invoke::run(InvokeArgs { kind, intent, item, launched })
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
