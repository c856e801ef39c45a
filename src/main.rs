use std::process::ExitCode;

fn main() -> ExitCode {
    classy::cli::run()
}
