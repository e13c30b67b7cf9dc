use std::process::ExitCode;

fn main() -> ExitCode {
    shoplist_cli::run()
}
