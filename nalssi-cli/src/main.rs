//! Binary crate for the `nalssi` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments and interactive prompts
//! - Configuring the API key
//! - Human-friendly output and error guidance

use clap::Parser;
use tracing_subscriber::EnvFilter;

use nalssi_core::WeatherError;

mod cli;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cmd = cli::Cli::parse();

    if let Err(err) = cmd.run().await {
        match err.downcast_ref::<WeatherError>() {
            Some(weather_err) => {
                eprintln!("Error: {weather_err}");
                if let Some(hint) = cli::remediation_hint(weather_err) {
                    eprintln!("{hint}");
                }
            }
            None => eprintln!("Error: {err:#}"),
        }
        std::process::exit(1);
    }
}
