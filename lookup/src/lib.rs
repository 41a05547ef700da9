mod cache;
pub mod client;
pub mod config;
pub mod errors;
pub mod metrics_defs;
mod relay_links;
mod service;
mod session;
#[cfg(test)]
mod testutils;
mod video_id;

pub use client::{LookupApi, TikApiClient};
pub use errors::LookupError;
pub use service::{LookupBody, LookupService};

use shared::admin_service::AdminService;
use shared::http::run_http_service;
use std::sync::Arc;

/// Runs the lookup service and its admin listener until either fails.
pub async fn run(config: config::Config) -> Result<(), LookupError> {
    config.validate()?;

    tracing::info!(
        api = %config.api.base_url,
        cache = config.cache.enabled,
        relay_path = %config.relay_path,
        "starting lookup service"
    );

    let client = TikApiClient::new(&config.api)?;
    let lookup_service = LookupService::new(Arc::new(client), &config);
    let lookup_task = run_http_service(
        &config.listener.host,
        config.listener.port,
        lookup_service,
    );

    let admin_service = AdminService::new(|| true);
    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        admin_service,
    );

    tokio::try_join!(lookup_task, admin_task)?;
    Ok(())
}
