use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tablegate::cli::{self, Cli, Response};
use tablegate::error::{GatewayError, Severity};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(response) => {
            println!("{}", response.body);
            ExitCode::from(response.exit_code)
        }
        Err(err) => {
            eprintln!("Error: {err:#}");
            let severity = err
                .downcast_ref::<GatewayError>()
                .map(GatewayError::severity)
                .unwrap_or(Severity::Internal);
            ExitCode::from(severity.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<Response> {
    let gateway = cli.settings.gateway()?;
    let response = cli::dispatch(&cli.command, &gateway).await?;
    Ok(response)
}
