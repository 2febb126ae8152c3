use std::io::{self, BufRead, Write};

use foafrag_core::config::{AppConfig, LoadOptions};

use super::CommandResult;

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return CommandResult::failure("chat", "config", error.to_string(), 2),
    };

    let runtime = match super::build_runtime() {
        Ok(runtime) => runtime,
        Err(error) => return CommandResult::failure("chat", "runtime", error, 2),
    };

    let pipeline = match super::build_pipeline(&config) {
        Ok(pipeline) => pipeline,
        Err(error) => return CommandResult::failure("chat", "setup", error, 2),
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut turns = 0u32;

    println!("foafrag chat ({:?} store) - type `exit` to leave", config.store.kind);
    loop {
        print!("> ");
        if stdout.flush().is_err() {
            break;
        }

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }

        let request = line.trim();
        if request.is_empty() {
            continue;
        }
        if request.eq_ignore_ascii_case("exit") || request.eq_ignore_ascii_case("quit") {
            break;
        }

        let outcome = runtime.block_on(pipeline.run(request));
        println!("{}", outcome.answer);
        turns += 1;
    }

    CommandResult::success("chat", format!("session ended after {turns} turn(s)"))
}
