use clap::Parser;
use log::error;

use election_manager::cli::{self, Cli};

fn main() {
    // Initialize logging
    dotenvy::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = cli::run(cli) {
        error!("Command failed: {}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
