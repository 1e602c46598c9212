//! # AAS-EventBridge Agent
//!
//! Publishes mutations of an AAS model to an MQTT broker.
//!
//! ## Architecture
//!
//! 1. **Connection**: one broker session shared by every publisher
//! 2. **Observer**: announces the observed shell or submodel, filters and
//!    publishes mutation events
//! 3. **Databus**: logs inbound I4.0 messages
//!
//! Mutation events are read as JSON lines from stdin, e.g.
//!
//! ```text
//! {"kind":"element_value_changed","ids":{"shellId":"S1","submodelId":"SM1"},"path":"temperature","value":25.5}
//! ```

use anyhow::Result;
use tracing_subscriber::EnvFilter;

mod config;
mod runtime;

pub use config::BridgeConfig;
pub use runtime::Bridge;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting AAS-EventBridge Agent"
    );

    // Load configuration
    let config = BridgeConfig::from_env()?;

    tracing::info!(
        broker = %config.connection.broker,
        client_id = %config.connection.client_id,
        shell_id = %config.shell_id,
        submodel_id = ?config.submodel_id,
        "Bridge configured"
    );

    Bridge::new(config).run().await
}
