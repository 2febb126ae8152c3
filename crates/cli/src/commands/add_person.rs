use clap::Args;

use foafrag_core::config::{AppConfig, LoadOptions, StoreKind};
use foafrag_store::directory;
use foafrag_store::NewPerson;

use super::CommandResult;

#[derive(Debug, Args)]
pub struct AddPersonArgs {
    #[arg(long, help = "Full name (required)")]
    pub name: String,
    #[arg(long)]
    pub age: Option<i64>,
    #[arg(long, help = "One of: male, female, other, non-binary")]
    pub gender: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub city: Option<String>,
    #[arg(long)]
    pub state: Option<String>,
    #[arg(long)]
    pub postal_code: Option<String>,
    #[arg(long)]
    pub country: Option<String>,
    #[arg(long)]
    pub job_title: Option<String>,
    #[arg(long)]
    pub occupation: Option<String>,
    #[arg(long)]
    pub industry: Option<String>,
}

impl AddPersonArgs {
    fn into_person(self) -> NewPerson {
        NewPerson {
            name: self.name,
            age: self.age,
            gender: self.gender,
            phone: self.phone,
            email: self.email,
            address: self.address,
            city: self.city,
            state: self.state,
            postal_code: self.postal_code,
            country: self.country,
            job_title: self.job_title,
            occupation: self.occupation,
            industry: self.industry,
        }
    }
}

pub fn run(args: AddPersonArgs) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return CommandResult::failure("add-person", "config", error.to_string(), 2),
    };
    if config.store.kind != StoreKind::Graph {
        return CommandResult::failure(
            "add-person",
            "store",
            "direct inserts require the graph store; the vector store ingests offline",
            2,
        );
    }

    let runtime = match super::build_runtime() {
        Ok(runtime) => runtime,
        Err(error) => return CommandResult::failure("add-person", "runtime", error, 2),
    };
    let store = match super::build_store(&config) {
        Ok(store) => store,
        Err(error) => return CommandResult::failure("add-person", "setup", error, 2),
    };

    let person = args.into_person();
    match runtime.block_on(directory::create_person(&store, &person)) {
        Ok(person_uri) => CommandResult::success(
            "add-person",
            format!("inserted `{}` as <{person_uri}>", person.name),
        ),
        Err(error) => CommandResult::failure("add-person", "store", error.to_string(), 1),
    }
}
