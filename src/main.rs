use anyhow::Result;
use clap::Parser;

use rjn_forwarder::cli::{Cli, Commands};
use rjn_forwarder::{ping, version};

fn init_tracing() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,rjn_forwarder=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init()
        .map_err(|err| anyhow::anyhow!(err.to_string()))?;
    Ok(())
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing()?;

    let cli = Cli::parse();
    match cli.command {
        Commands::Ping(args) => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(ping::run(args))
        }
        Commands::Version => {
            println!("{}", version::artifact_name());
            Ok(())
        }
    }
}
