use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rjn-forwarder", version, about = "RJN Clarity ingestion client CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Probe every configured RJN URL and verify the stored credentials.
    Ping(PingArgs),
    /// Print the distribution artifact name for this build.
    Version,
}

#[derive(Args)]
pub struct PingArgs {
    /// Secrets file path (otherwise RJN_SECRETS_FILE or the default location).
    #[arg(long)]
    pub secrets: Option<PathBuf>,
}
