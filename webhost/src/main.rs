//! `webhost` binary.
//!
//! ```sh
//! webhost init            # Generate default config.toml
//! webhost serve           # Start the server
//! webhost native          # Start the server in a native window
//! ```

use clap::Parser;
use dotenvy::dotenv;
use webhost::cmd::{self, Cli, Commands};
use webhost::telemetry::Telemetry;

#[tokio::main]
#[allow(clippy::print_stderr)]
async fn main() {
    dotenv().ok();
    let cli = Cli::parse();

    let telemetry = Telemetry::new()
        .with_name(env!("CARGO_PKG_NAME"))
        .with_version(env!("CARGO_PKG_VERSION"))
        .register();

    let result = match cli.command {
        Commands::Init { output, force } => cmd::init::run(&output, force).map(|()| 0),
        Commands::Serve { config } => cmd::serve::run(&config).await.map(|cause| cause.exit_code()),
        Commands::Native { config } => cmd::native::run(&config).await.map(|cause| cause.exit_code()),
    };

    drop(telemetry);
    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
