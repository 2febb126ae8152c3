use foafrag_core::config::{AppConfig, LoadOptions};

use super::CommandResult;

pub fn run(request: &str, json_output: bool) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return CommandResult::failure("ask", "config", error.to_string(), 2),
    };

    let runtime = match super::build_runtime() {
        Ok(runtime) => runtime,
        Err(error) => return CommandResult::failure("ask", "runtime", error, 2),
    };

    let pipeline = match super::build_pipeline(&config) {
        Ok(pipeline) => pipeline,
        Err(error) => return CommandResult::failure("ask", "setup", error, 2),
    };

    let outcome = runtime.block_on(pipeline.run(request));

    if json_output {
        let output = serde_json::to_string_pretty(&outcome)
            .unwrap_or_else(|error| format!("{{\"error\":\"serialization failed: {error}\"}}"));
        let exit_code = u8::from(!outcome.succeeded);
        return CommandResult { exit_code, output };
    }

    let exit_code = u8::from(!outcome.succeeded);
    let output = format!("{}\n({} ms)", outcome.answer, outcome.elapsed_ms);
    CommandResult { exit_code, output }
}
