pub mod config;
pub mod errors;
pub mod media_ref;
pub mod metrics_defs;
mod relay;
mod service;
#[cfg(test)]
mod testutils;
mod upstream;

pub use errors::RelayError;
pub use media_ref::SignedMediaRef;
pub use relay::{Relay, RelayBody};
pub use service::{RELAY_PATH, RelayService};

use shared::admin_service::AdminService;
use shared::http::run_http_service;

/// Runs the relay and its admin listener until either fails.
pub async fn run(config: config::Config) -> Result<(), RelayError> {
    config.validate()?;

    tracing::info!(
        media_url = %config.upstream.media_url,
        forward_proxy = config.forward_proxy.url.host_str().unwrap_or_default(),
        "starting relay"
    );

    let relay_service = RelayService::new(Relay::new(&config)?);
    let relay_task = run_http_service(
        &config.listener.host,
        config.listener.port,
        relay_service,
    );

    // The relay keeps no state that could make it unready
    let admin_service = AdminService::new(|| true);
    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        admin_service,
    );

    tokio::try_join!(relay_task, admin_task)?;
    Ok(())
}
