use clap::Parser;
use pairtrader::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
