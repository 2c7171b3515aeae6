use anyhow::Result;
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::PingArgs;
use crate::client::RjnClient;
use crate::config::{self, Secrets};

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const PROVIDER_TAG: &str = "rjn";

/// Lightweight reachability check: GET the URL and treat any success or
/// redirect status as alive.
pub async fn probe(url: &str) -> bool {
    let client = match reqwest::Client::builder().timeout(PROBE_TIMEOUT).build() {
        Ok(client) => client,
        Err(err) => {
            warn!(error = %err, "failed to build probe client");
            return false;
        }
    };
    match client.get(url).send().await {
        Ok(response) if response.status().is_success() || response.status().is_redirection() => {
            info!(%url, status = response.status().as_u16(), "ping ok");
            true
        }
        Ok(response) => {
            warn!(%url, status = response.status().as_u16(), "ping returned an error status");
            false
        }
        Err(err) => {
            warn!(%url, error = %err, "ping failed");
            false
        }
    }
}

/// Probes every configured URL that belongs to the RJN provider.
pub async fn ping_provider_urls(secrets: &Secrets) {
    for url in secrets.find_urls() {
        if url.to_lowercase().contains(PROVIDER_TAG) {
            probe(&url).await;
        }
    }
}

/// The `ping` subcommand: probe all configured RJN URLs, then attempt a real
/// login to confirm the credentials still work. Auth failures are reported,
/// not fatal; the command exists for unattended diagnostics.
pub async fn run(args: PingArgs) -> Result<()> {
    let path = args.secrets.unwrap_or_else(config::secrets_path);
    let secrets = Secrets::load(&path)?;

    ping_provider_urls(&secrets).await;

    let base_url = secrets.get_required("rjn", "url")?;
    let client_id = secrets.get_required("rjn", "client_id")?;
    let password = secrets.get_required("rjn", "password")?;

    let client = RjnClient::new(&base_url)?;
    match client.authenticate(&client_id, &password).await {
        Ok(_session) => {
            info!("RJN session established successfully");
            probe(&base_url).await;
        }
        Err(err) => {
            warn!(error = %err, "RJN session not established; skipping RJN-related data transmission");
        }
    }
    Ok(())
}
