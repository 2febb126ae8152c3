use std::process::ExitCode;

fn main() -> ExitCode {
    foafrag_cli::run()
}
