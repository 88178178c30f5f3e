use std::process::ExitCode;

fn main() -> ExitCode {
    kunan_cli::run()
}
