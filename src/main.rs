use clap::Parser;
use indexvol::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
