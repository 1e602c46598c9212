//! # MQTT Transport
//!
//! Owns the single broker session of a bridge instance.
//!
//! - [`ConnectionManager`]: connect, subscribe, publish, connection-loss
//!   notification. No automatic reconnection.
//! - [`Publisher`]: the publish seam the event observer depends on.
//! - [`MessageHandler`]: inbound delivery callbacks.
//! - [`Databus`]: I4.0 language messages over one connection.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod connection;
pub mod databus;
pub mod handler;

pub use connection::{
    ConnectOutcome, ConnectionError, ConnectionManager, ConnectionOptions, Credentials,
    PublishError, Publisher,
};
pub use databus::{Databus, DEFAULT_PUB_TOPIC, DEFAULT_SUB_TOPIC};
pub use handler::{I40MessageHandler, LoggingHandler, MessageHandler};
pub use rumqttc::QoS;
