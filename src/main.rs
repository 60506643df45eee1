use clap::Parser;
use indexboard::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
