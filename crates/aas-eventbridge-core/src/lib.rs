//! # AAS-EventBridge Core
//!
//! Domain-side contract of the event bridge.
//!
//! This crate provides:
//! - Element path normalization shared by filtering and topic naming
//! - Submodel element snapshots with value redaction
//! - The `MutationEvent` type delivered by an observable AAS model
//! - Observer registration (`ModelObserver`, `ObservableModel`)
//! - Whitelist-based filtering of element paths
//! - Attribute-based authorization seam for registry operations

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod authorization;
pub mod element;
pub mod event;
pub mod filter;
pub mod observer;
pub mod path;

pub use authorization::{AbacRuleChecker, NotAuthorized, RegistryAuthorizer, RoleAuthenticator};
pub use element::SubmodelElement;
pub use event::{EntityIds, EventKind, MutationEvent};
pub use filter::FilterPolicy;
pub use observer::{ModelObserver, ObservableModel, ObserverRegistry};
pub use path::normalize_path;
