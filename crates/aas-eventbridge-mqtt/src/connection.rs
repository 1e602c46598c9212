//! Broker session management.

use crate::handler::{LoggingHandler, MessageHandler};
use parking_lot::{Mutex, RwLock};
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Capacity of the request channel between client handle and event loop.
const REQUEST_CAPACITY: usize = 100;

/// Username/password pair for brokers that require authentication.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Username
    pub username: String,
    /// Password
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Options for one broker session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionOptions {
    /// MQTT broker URL (e.g., <tcp://localhost:1883>)
    pub broker: String,
    /// Client ID for the MQTT connection
    pub client_id: String,
    /// Credentials; `None` connects anonymously
    pub credentials: Option<Credentials>,
    /// Keep-alive interval
    pub keep_alive: Duration,
    /// Upper bound for establishing the session
    pub connect_timeout: Duration,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            broker: "tcp://localhost:1883".to_string(),
            client_id: format!("aas-eventbridge-{}", uuid::Uuid::new_v4()),
            credentials: None,
            keep_alive: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl ConnectionOptions {
    /// Options for an anonymous session.
    #[must_use]
    pub fn new(broker: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            broker: broker.into(),
            client_id: client_id.into(),
            ..Self::default()
        }
    }

    /// Authenticate with username and password.
    #[must_use]
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some(Credentials {
            username: username.into(),
            password: password.into(),
        });
        self
    }
}

/// Result of a successful [`ConnectionManager::connect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// A new session was established
    Connected,
    /// A session with identical options already existed; nothing was done
    AlreadyConnected,
}

/// Outbound publish seam.
///
/// Implemented by [`ConnectionManager`]; the event observer only depends on
/// this trait so that publishes can be captured in tests.
pub trait Publisher: Send + Sync {
    /// Send one message. Returns once the message is handed to the transport.
    ///
    /// # Errors
    ///
    /// Returns error if there is no session or the transport rejects the message.
    fn publish(&self, topic: &str, payload: Vec<u8>, qos: QoS, retain: bool) -> Result<(), PublishError>;
}

enum Session {
    Disconnected,
    Connecting,
    Connected {
        client: AsyncClient,
        options: ConnectionOptions,
        subscription: Option<String>,
        generation: u64,
    },
}

struct Shared {
    session: Mutex<Session>,
    handler: RwLock<Arc<dyn MessageHandler>>,
    generation: AtomicU64,
}

/// Owner of the single broker session of a bridge instance.
///
/// Only the manager touches the transport. Once connected, a background task
/// delivers inbound messages to the installed [`MessageHandler`]. When the
/// transport drops, the handler is notified and the manager stays
/// disconnected until `connect` is called again.
pub struct ConnectionManager {
    shared: Arc<Shared>,
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionManager {
    /// Create a disconnected manager with a logging handler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                session: Mutex::new(Session::Disconnected),
                handler: RwLock::new(Arc::new(LoggingHandler)),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Install the handler for inbound messages, acknowledgements and
    /// connection loss.
    pub fn set_handler(&self, handler: Arc<dyn MessageHandler>) {
        *self.shared.handler.write() = handler;
    }

    /// Establish a session.
    ///
    /// Connects anonymously unless credentials are set. If a session with
    /// identical options exists the call is a no-op reported as
    /// [`ConnectOutcome::AlreadyConnected`]; a session with different options
    /// is never silently kept.
    ///
    /// # Errors
    ///
    /// Returns error if the URL is invalid, the broker is unreachable or
    /// refuses the session, the attempt times out, or a different session
    /// is already active.
    pub async fn connect(&self, options: ConnectionOptions) -> Result<ConnectOutcome, ConnectionError> {
        let slot = {
            let mut session = self.shared.session.lock();
            match &*session {
                Session::Connected { options: current, .. } if *current == options => {
                    tracing::debug!(broker = %options.broker, "Already connected");
                    return Ok(ConnectOutcome::AlreadyConnected);
                }
                Session::Connected { options: current, .. } => {
                    return Err(ConnectionError::AlreadyConnected {
                        broker: current.broker.clone(),
                        client_id: current.client_id.clone(),
                    });
                }
                Session::Connecting => return Err(ConnectionError::ConnectInProgress),
                Session::Disconnected => {}
            }
            *session = Session::Connecting;
            ConnectingSlot::new(&self.shared)
        };

        match establish(&options).await {
            Ok((client, eventloop)) => {
                let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
                *self.shared.session.lock() = Session::Connected {
                    client,
                    options: options.clone(),
                    subscription: None,
                    generation,
                };
                slot.disarm();

                tracing::info!(broker = %options.broker, client_id = %options.client_id, "Connected to MQTT broker");
                tokio::spawn(deliver(
                    Arc::clone(&self.shared),
                    eventloop,
                    options.broker,
                    generation,
                ));
                Ok(ConnectOutcome::Connected)
            }
            Err(err) => {
                tracing::error!(error = %err, broker = %options.broker, "MQTT connection couldn't be established");
                Err(err)
            }
        }
    }

    /// Register the inbound subscription (at-least-once).
    ///
    /// Only one inbound topic is allowed per manager; subscribing to the
    /// same topic again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns error if not connected, if a different topic is already
    /// subscribed, or if the request cannot be queued.
    pub fn subscribe(&self, topic: &str) -> Result<(), ConnectionError> {
        let mut session = self.shared.session.lock();
        let Session::Connected {
            client,
            subscription,
            ..
        } = &mut *session
        else {
            return Err(ConnectionError::NotConnected);
        };

        match subscription.as_deref() {
            Some(existing) if existing == topic => return Ok(()),
            Some(existing) => return Err(ConnectionError::AlreadySubscribed(existing.to_string())),
            None => {}
        }

        tracing::info!(topic, "Subscribing to inbound topic");
        client
            .try_subscribe(topic, QoS::AtLeastOnce)
            .map_err(|e| ConnectionError::Subscribe(e.to_string()))?;
        *subscription = Some(topic.to_string());
        Ok(())
    }

    /// Close the session, if any.
    pub fn disconnect(&self) {
        let previous = std::mem::replace(&mut *self.shared.session.lock(), Session::Disconnected);
        if let Session::Connected { client, options, .. } = previous {
            tracing::info!(broker = %options.broker, "Disconnecting from MQTT broker");
            if let Err(e) = client.try_disconnect() {
                tracing::warn!(error = %e, "Failed to send disconnect");
            }
        }
    }

    /// Whether a session is established.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(&*self.shared.session.lock(), Session::Connected { .. })
    }

    /// Broker URL of the current session.
    #[must_use]
    pub fn broker(&self) -> Option<String> {
        match &*self.shared.session.lock() {
            Session::Connected { options, .. } => Some(options.broker.clone()),
            Session::Disconnected | Session::Connecting => None,
        }
    }

    /// Topic of the inbound subscription, if any.
    #[must_use]
    pub fn subscription(&self) -> Option<String> {
        match &*self.shared.session.lock() {
            Session::Connected { subscription, .. } => subscription.clone(),
            Session::Disconnected | Session::Connecting => None,
        }
    }
}

impl Publisher for ConnectionManager {
    fn publish(&self, topic: &str, payload: Vec<u8>, qos: QoS, retain: bool) -> Result<(), PublishError> {
        let client = match &*self.shared.session.lock() {
            Session::Connected { client, .. } => client.clone(),
            Session::Disconnected | Session::Connecting => return Err(PublishError::NotConnected),
        };

        tracing::debug!(topic, payload_len = payload.len(), ?qos, retain, "Publishing message");
        client
            .try_publish(topic, qos, retain, payload)
            .map_err(|e| PublishError::Publish(e.to_string()))
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Reservation of the session slot for one connect attempt.
///
/// Releases the slot back to `Disconnected` when dropped, including when the
/// connect future is cancelled mid-handshake.
struct ConnectingSlot<'a> {
    shared: &'a Shared,
    armed: bool,
}

impl<'a> ConnectingSlot<'a> {
    fn new(shared: &'a Shared) -> Self {
        Self {
            shared,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for ConnectingSlot<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut session = self.shared.session.lock();
        if matches!(&*session, Session::Connecting) {
            *session = Session::Disconnected;
        }
    }
}

/// Drive the event loop until the broker acknowledges the session.
async fn establish(options: &ConnectionOptions) -> Result<(AsyncClient, EventLoop), ConnectionError> {
    let (host, port) = parse_mqtt_url(&options.broker)?;

    let mut mqtt_options = MqttOptions::new(&options.client_id, host, port);
    mqtt_options.set_keep_alive(options.keep_alive);
    if let Some(credentials) = &options.credentials {
        mqtt_options.set_credentials(&credentials.username, &credentials.password);
    }

    let (client, mut eventloop) = AsyncClient::new(mqtt_options, REQUEST_CAPACITY);

    let handshake = async {
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => return Ok(()),
                Ok(_) => {}
                Err(e) => return Err(ConnectionError::Connect(e.to_string())),
            }
        }
    };

    tokio::time::timeout(options.connect_timeout, handshake)
        .await
        .map_err(|_| ConnectionError::Timeout(options.connect_timeout))??;

    Ok((client, eventloop))
}

/// Delivery task of one session. Ends on the first transport error.
async fn deliver(shared: Arc<Shared>, mut eventloop: EventLoop, broker: String, generation: u64) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let handler = Arc::clone(&*shared.handler.read());
                handler.message_arrived(&publish.topic, &publish.payload);
            }
            Ok(Event::Incoming(Packet::PubAck(ack))) => {
                let handler = Arc::clone(&*shared.handler.read());
                handler.delivery_complete(ack.pkid);
            }
            Ok(Event::Incoming(Packet::SubAck(_))) => {
                tracing::info!("Subscription acknowledged");
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                tracing::debug!(broker = %broker, "Session closed");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                let lost = {
                    let mut session = shared.session.lock();
                    let current = matches!(
                        &*session,
                        Session::Connected { generation: g, .. } if *g == generation
                    );
                    if current {
                        *session = Session::Disconnected;
                    }
                    current
                };

                if lost {
                    let handler = Arc::clone(&*shared.handler.read());
                    handler.connection_lost(&broker, &e.to_string());
                }
                break;
            }
        }
    }
}

/// Split a broker address into host and port.
///
/// Accepts `tcp://` and `mqtt://` URLs as well as a bare `host[:port]`;
/// the port defaults to 1883.
fn parse_mqtt_url(input: &str) -> Result<(String, u16), ConnectionError> {
    let invalid = |reason: String| ConnectionError::InvalidUrl(format!("{input}: {reason}"));

    let url = if input.contains("://") {
        Url::parse(input)
    } else {
        Url::parse(&format!("tcp://{input}"))
    }
    .map_err(|e| invalid(e.to_string()))?;

    if !matches!(url.scheme(), "tcp" | "mqtt") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.path().len() > 1 {
        return Err(invalid(format!("unexpected path '{}'", url.path())));
    }

    let host = url
        .host_str()
        .filter(|host| !host.is_empty())
        .ok_or_else(|| invalid("missing host".to_string()))?;

    Ok((host.to_string(), url.port().unwrap_or(1883)))
}

/// Errors of session management.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    /// Invalid MQTT URL
    #[error("invalid MQTT URL: {0}")]
    InvalidUrl(String),
    /// Broker unreachable or session refused
    #[error("connection error: {0}")]
    Connect(String),
    /// No acknowledgement within the connect timeout
    #[error("connection timed out after {0:?}")]
    Timeout(Duration),
    /// A session with different options is active
    #[error("already connected to {broker} as {client_id}")]
    AlreadyConnected {
        /// Broker of the active session
        broker: String,
        /// Client id of the active session
        client_id: String,
    },
    /// Another connect call is in flight
    #[error("connection attempt already in progress")]
    ConnectInProgress,
    /// Operation needs a session
    #[error("not connected")]
    NotConnected,
    /// A different inbound topic is already subscribed
    #[error("already subscribed to {0}")]
    AlreadySubscribed(String),
    /// Subscription failed
    #[error("subscription error: {0}")]
    Subscribe(String),
}

/// Errors of a single publish.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PublishError {
    /// No session
    #[error("not connected")]
    NotConnected,
    /// The transport rejected the message
    #[error("publish error: {0}")]
    Publish(String),
    /// The payload could not be serialized
    #[error("serialize error: {0}")]
    Serialize(String),
}
