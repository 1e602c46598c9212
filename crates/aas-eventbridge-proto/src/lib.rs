//! # AAS-EventBridge Protocol
//!
//! Topic naming and message envelopes for the event bridge.
//!
//! ## Topics
//!
//! Mutation events are published below
//! `aas-repository/{repo}/shells/{shellIdBase64}/...`, one disjoint suffix per
//! event kind (see [`topics`]).
//!
//! ## Messages
//!
//! - `MessageFrame`: I4.0 language envelope (sender, receiver, correlation ids,
//!   semantic protocol)
//! - `I40Message`: a frame plus its interaction elements

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod encoding;
pub mod frame;
pub mod messages;
pub mod topics;

pub use encoding::{decode_id_base64url, encode_id_base64url, EncodingError};
pub use frame::{
    FrameError, MessageFrame, MessageFrameBuilder, Participant, SemanticProtocol,
    SemanticProtocolKey,
};
pub use messages::{GenericMessage, I40Message, SubmodelElementMessage};
pub use topics::{ParsedTopic, TopicKind, TopicScheme, DEFAULT_REPOSITORY, TOPIC_ROOT};
