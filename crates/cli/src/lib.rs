pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "foafrag",
    about = "FoaF retrieval pipeline CLI",
    long_about = "Ask questions against a FoaF social graph through either a SPARQL triple store \
or an embedding store, and manage persons and relationships directly.",
    after_help = "Examples:\n  foafrag ask \"who are David's friends?\"\n  foafrag add-person --name \"Alice Smith\" --age 34\n  foafrag doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Answer one natural-language request and exit")]
    Ask {
        #[arg(help = "The request, quoted or as trailing words", required = true)]
        request: Vec<String>,
        #[arg(long, help = "Emit the full run envelope as JSON")]
        json: bool,
    },
    #[command(about = "Interactive loop; reads requests from stdin until `exit`")]
    Chat,
    #[command(about = "Insert a person directly, bypassing operation generation")]
    AddPerson(commands::add_person::AddPersonArgs),
    #[command(about = "Insert a relationship between two known persons")]
    AddRelationship(commands::add_relationship::AddRelationshipArgs),
    #[command(about = "Validate config, store connectivity, and model readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Inspect effective configuration values with secrets redacted")]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Ask { request, json } => commands::ask::run(&request.join(" "), json),
        Command::Chat => commands::chat::run(),
        Command::AddPerson(args) => commands::add_person::run(args),
        Command::AddRelationship(args) => commands::add_relationship::run(args),
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
