pub mod config;
pub mod credential;
pub mod error;
pub mod logging;
pub mod model;
pub mod model_gateway;
pub mod providers;
pub mod remediation;
pub mod repl;

use anyhow::{Context, Result};
use reqwest::Client;
use tracing::info;

use config::Config;
use model_gateway::HostModelGateway;
use repl::run_repl;

pub async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    let _log_guard = logging::init();

    let cfg = Config::from_env();
    info!(
        model = %cfg.model,
        api_base_url = %cfg.api_base_url,
        "loaded runtime configuration"
    );

    let Some(credential) = credential::resolve_from_env()? else {
        info!("no api credential supplied; exiting");
        return Ok(());
    };

    let client = Client::builder()
        .build()
        .context("Failed to initialize HTTP client")?;
    let gateway = HostModelGateway::new(&client, &cfg, credential);

    let exit = run_repl(&gateway).await?;
    info!(?exit, "conversation ended");
    Ok(())
}
