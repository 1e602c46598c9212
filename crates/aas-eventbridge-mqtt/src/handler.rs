//! Inbound delivery callbacks.
//!
//! Callbacks run on the connection's delivery task, concurrently with
//! publishes issued from other threads.

use aas_eventbridge_proto::I40Message;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

/// Receiver of broker-side events.
///
/// Every method has a default that only logs, so implementors override
/// what they need.
pub trait MessageHandler: Send + Sync {
    /// A message arrived on a subscribed topic.
    fn message_arrived(&self, topic: &str, payload: &[u8]) {
        tracing::debug!(topic, payload_len = payload.len(), "Received MQTT message");
    }

    /// The broker acknowledged an at-least-once publish.
    fn delivery_complete(&self, packet_id: u16) {
        tracing::debug!(packet_id, "Successfully delivered message");
    }

    /// The session dropped. No reconnection is attempted.
    fn connection_lost(&self, broker: &str, cause: &str) {
        tracing::error!(broker, cause, "MQTT lost connection");
    }
}

/// Handler that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl MessageHandler for LoggingHandler {}

/// Decodes inbound payloads as I4.0 messages and hands valid ones to a callback.
///
/// Payloads that do not decode, or whose frame is invalid, are logged and dropped.
pub struct I40MessageHandler<T, F> {
    callback: F,
    _marker: PhantomData<fn() -> T>,
}

impl<T, F> I40MessageHandler<T, F>
where
    T: DeserializeOwned,
    F: Fn(&str, I40Message<T>) + Send + Sync,
{
    /// Wrap a callback receiving the topic and the decoded message.
    #[must_use]
    pub fn new(callback: F) -> Self {
        Self {
            callback,
            _marker: PhantomData,
        }
    }
}

impl<T, F> MessageHandler for I40MessageHandler<T, F>
where
    T: DeserializeOwned,
    F: Fn(&str, I40Message<T>) + Send + Sync,
{
    fn message_arrived(&self, topic: &str, payload: &[u8]) {
        match I40Message::<T>::from_json(payload) {
            Ok(message) => {
                tracing::debug!(
                    topic,
                    conversation_id = %message.frame.conversation_id,
                    message_type = %message.frame.message_type,
                    "Received I4.0 message"
                );
                (self.callback)(topic, message);
            }
            Err(err) => {
                tracing::warn!(error = %err, topic, payload_len = payload.len(), "Unable to parse I4.0 message");
            }
        }
    }
}
