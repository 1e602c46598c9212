//! # AAS-EventBridge Observer
//!
//! Bridges model mutations to the broker.
//!
//! An [`EventObserver`] registers with an observable model, filters
//! element-scoped events through a whitelist, builds the payload for each
//! event and publishes it on the topic derived from the event's identifiers.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod observer;
pub mod payload;

pub use observer::{AttachError, EventObserver, ObserverScope, ObserverState};
pub use payload::{combined_message, event_payload, PayloadError};
