//! HTTP server for the Payroll Computation Engine.
//!
//! Reads `PAYROLL_CONFIG_DIR` (default `./config/default`) and
//! `PAYROLL_BIND_ADDR` (default `127.0.0.1:3000`).

use std::env;
use std::net::SocketAddr;

use payroll_engine::api::{AppState, create_router};
use payroll_engine::config::ConfigLoader;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_CONFIG_DIR: &str = "./config/default";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "payroll_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_dir = env::var("PAYROLL_CONFIG_DIR").unwrap_or_else(|_| DEFAULT_CONFIG_DIR.into());
    let bind_addr: SocketAddr = env::var("PAYROLL_BIND_ADDR")
        .unwrap_or_else(|_| DEFAULT_BIND_ADDR.into())
        .parse()?;

    let config = ConfigLoader::load(&config_dir)?;
    let router = create_router(AppState::new(config));

    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!(%bind_addr, config_dir = %config_dir, "Payroll engine listening");
    axum::serve(listener, router).await?;
    Ok(())
}
