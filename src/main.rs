//! tapflow CLI
//!
//! Command-line interface for running taps

use clap::Parser;
use tapflow::cli::{Cli, Runner};

#[tokio::main]
async fn main() {
    // Initialize logging on stderr; stdout is reserved for messages
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let runner = Runner::new(cli);

    if let Err(e) = runner.run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
