use std::process::ExitCode;

fn main() -> ExitCode {
    revlens_cli::run()
}
