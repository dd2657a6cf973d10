//! Standalone broker
//!
//! Run with: cargo run --example broker
//!
//! Expects `BROKER_CERT_DIR` to point at a directory containing the broker's
//! TLS identity as `server.crt` and `server.key`. Producers connect to port
//! 8081, consumers to port 8082. Ctrl-C shuts down.

use std::env;
use std::path::PathBuf;

use broker_rs::transport::TlsServerConfig;
use broker_rs::{Broker, BrokerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cert_dir = PathBuf::from(env::var("BROKER_CERT_DIR")?);
    let tls = TlsServerConfig::from_pem_files(
        cert_dir.join("server.crt"),
        cert_dir.join("server.key"),
    )?;

    let broker = Broker::new(BrokerConfig::default(), tls);
    broker
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}
