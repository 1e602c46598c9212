//! I4.0 message bus over one broker session.
//!
//! Outbound messages go to a fixed publish topic; inbound messages arrive on
//! a fixed subscribe topic and are handed to the installed
//! [`MessageHandler`].

use crate::connection::{ConnectionError, ConnectionManager, ConnectionOptions, Publisher};
use crate::handler::MessageHandler;
use aas_eventbridge_proto::I40Message;
use rumqttc::QoS;
use serde::Serialize;
use std::sync::Arc;

/// Default inbound topic.
pub const DEFAULT_SUB_TOPIC: &str = "i40/inbox";

/// Default outbound topic.
pub const DEFAULT_PUB_TOPIC: &str = "i40/outbox";

/// Publishes I4.0 messages on a fixed topic.
pub struct Databus<P: Publisher = ConnectionManager> {
    publisher: Arc<P>,
    pub_topic: String,
    sub_topic: String,
}

impl Databus<ConnectionManager> {
    /// Open a dedicated session and subscribe to `sub_topic`.
    ///
    /// # Errors
    ///
    /// Returns error if the session cannot be established or the
    /// subscription is refused.
    pub async fn init(
        options: ConnectionOptions,
        sub_topic: impl Into<String>,
        pub_topic: impl Into<String>,
    ) -> Result<Self, ConnectionError> {
        let connection = Arc::new(ConnectionManager::new());
        connection.connect(options).await?;
        Self::with_connection(connection, sub_topic, pub_topic)
    }

    /// Share an established session and subscribe to `sub_topic`.
    ///
    /// # Errors
    ///
    /// Returns error if not connected or the session already subscribes to
    /// a different topic.
    pub fn with_connection(
        connection: Arc<ConnectionManager>,
        sub_topic: impl Into<String>,
        pub_topic: impl Into<String>,
    ) -> Result<Self, ConnectionError> {
        let sub_topic = sub_topic.into();
        connection.subscribe(&sub_topic)?;
        Ok(Self {
            publisher: connection,
            pub_topic: pub_topic.into(),
            sub_topic,
        })
    }

    /// Install the handler for inbound messages.
    pub fn set_handler(&self, handler: Arc<dyn MessageHandler>) {
        self.publisher.set_handler(handler);
    }
}

impl<P: Publisher> Databus<P> {
    /// Wrap an arbitrary publisher. No subscription is made.
    #[must_use]
    pub fn from_publisher(
        publisher: Arc<P>,
        sub_topic: impl Into<String>,
        pub_topic: impl Into<String>,
    ) -> Self {
        Self {
            publisher,
            pub_topic: pub_topic.into(),
            sub_topic: sub_topic.into(),
        }
    }

    /// Publish a message at-least-once, not retained.
    ///
    /// Messages with an invalid frame and failed publishes are logged and
    /// dropped; returns whether the message was handed to the transport.
    pub fn publish<T: Serialize>(&self, message: &I40Message<T>) -> bool {
        let payload = match message.to_json() {
            Ok(payload) => payload,
            Err(err) => {
                tracing::error!(error = %err, "Unable to encode I4.0 message");
                return false;
            }
        };

        match self
            .publisher
            .publish(&self.pub_topic, payload, QoS::AtLeastOnce, false)
        {
            Ok(()) => {
                tracing::debug!(
                    topic = %self.pub_topic,
                    conversation_id = %message.frame.conversation_id,
                    "Published I4.0 message"
                );
                true
            }
            Err(err) => {
                tracing::error!(error = %err, topic = %self.pub_topic, "Could not publish I4.0 message");
                false
            }
        }
    }

    /// Underlying publisher.
    #[must_use]
    pub fn connection(&self) -> &Arc<P> {
        &self.publisher
    }

    /// Outbound topic.
    #[must_use]
    pub fn pub_topic(&self) -> &str {
        &self.pub_topic
    }

    /// Inbound topic.
    #[must_use]
    pub fn sub_topic(&self) -> &str {
        &self.sub_topic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::PublishError;
    use aas_eventbridge_proto::{GenericMessage, MessageFrame, SemanticProtocol};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<(String, Vec<u8>, QoS, bool)>>,
        fail: bool,
    }

    impl Publisher for Recorder {
        fn publish(&self, topic: &str, payload: Vec<u8>, qos: QoS, retain: bool) -> Result<(), PublishError> {
            if self.fail {
                return Err(PublishError::Publish("broker gone".to_string()));
            }
            self.sent.lock().push((topic.to_string(), payload, qos, retain));
            Ok(())
        }
    }

    fn message() -> GenericMessage {
        let frame = MessageFrame::builder()
            .message_type("TEST_MESSAGE")
            .new_conversation()
            .message_id(1)
            .semantic_protocol(SemanticProtocol::global("CUSTOM", "TEST_PROTOCOL"))
            .build()
            .unwrap();
        GenericMessage::new(frame, Vec::new())
    }

    #[test]
    fn publishes_on_outbound_topic() {
        let recorder = Arc::new(Recorder::default());
        let bus = Databus::from_publisher(Arc::clone(&recorder), DEFAULT_SUB_TOPIC, DEFAULT_PUB_TOPIC);

        let message = message();
        assert!(bus.publish(&message));

        let sent = recorder.sent.lock();
        assert_eq!(sent.len(), 1);
        let (topic, payload, qos, retain) = &sent[0];
        assert_eq!(topic, "i40/outbox");
        assert_eq!(*qos, QoS::AtLeastOnce);
        assert!(!retain);
        assert_eq!(GenericMessage::from_json(payload).unwrap(), message);
    }

    #[test]
    fn invalid_frames_are_dropped() {
        let recorder = Arc::new(Recorder::default());
        let bus = Databus::from_publisher(Arc::clone(&recorder), "in", "out");

        let mut message = message();
        message.frame.conversation_id.clear();

        assert!(!bus.publish(&message));
        assert!(recorder.sent.lock().is_empty());
    }

    #[test]
    fn transport_failures_are_swallowed() {
        let recorder = Arc::new(Recorder {
            fail: true,
            ..Recorder::default()
        });
        let bus = Databus::from_publisher(recorder, "in", "out");
        assert!(!bus.publish(&message()));
    }

    #[test]
    fn requires_a_session() {
        let connection = Arc::new(ConnectionManager::new());
        let result = Databus::with_connection(connection, DEFAULT_SUB_TOPIC, DEFAULT_PUB_TOPIC);
        assert!(matches!(result, Err(ConnectionError::NotConnected)));
    }
}
