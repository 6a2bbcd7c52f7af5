//! Cancellation flow server entry-point.

mod server;

use actix_web::web;
use mockable::DefaultEnv;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use cancel_flow::inbound::http::health::HealthState;
use server::{BuildMode, build_cancel_flow, config_from_env, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(error) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(%error, "tracing init failed");
    }

    let config = config_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .map_err(std::io::Error::other)?;
    let cancel_flow = build_cancel_flow(config.database.clone()).await?;

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), cancel_flow, config)?;
    let result = server.await;
    health_state.mark_unhealthy();
    result
}
