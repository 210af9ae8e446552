use clap::Parser;
use foldersort::cli::{Cli, run};
use foldersort::output::OutputFormatter;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        OutputFormatter::error(&format!("Error: {}", e));
        std::process::exit(1);
    }
}
