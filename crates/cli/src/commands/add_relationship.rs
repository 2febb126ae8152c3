use clap::Args;

use foafrag_core::config::{AppConfig, LoadOptions, StoreKind};
use foafrag_store::directory;

use super::CommandResult;

#[derive(Debug, Args)]
pub struct AddRelationshipArgs {
    #[arg(long, help = "Name of the subject person")]
    pub from: String,
    #[arg(long, help = "Name of the related person")]
    pub to: String,
    #[arg(
        long,
        help = "Relationship kind: friendOf, spouseOf, parentOf, childOf, siblingOf, colleagueOf, neighborOf, knows"
    )]
    pub kind: String,
}

pub fn run(args: AddRelationshipArgs) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("add-relationship", "config", error.to_string(), 2)
        }
    };
    if config.store.kind != StoreKind::Graph {
        return CommandResult::failure(
            "add-relationship",
            "store",
            "direct inserts require the graph store; the vector store ingests offline",
            2,
        );
    }

    let runtime = match super::build_runtime() {
        Ok(runtime) => runtime,
        Err(error) => return CommandResult::failure("add-relationship", "runtime", error, 2),
    };
    let store = match super::build_store(&config) {
        Ok(store) => store,
        Err(error) => return CommandResult::failure("add-relationship", "setup", error, 2),
    };

    match runtime.block_on(directory::create_relationship(&store, &args.from, &args.to, &args.kind))
    {
        Ok(()) => CommandResult::success(
            "add-relationship",
            format!("linked `{}` -[{}]-> `{}`", args.from, args.kind, args.to),
        ),
        Err(error) => CommandResult::failure("add-relationship", "store", error.to_string(), 1),
    }
}
