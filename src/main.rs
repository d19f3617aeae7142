use std::process;
use clap::Parser;

use sfref::cli::Cli;

#[tokio::main]
async fn main() {
    // A local .env may carry SFREF_* overrides.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = cli.run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
