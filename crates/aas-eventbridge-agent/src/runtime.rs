//! Bridge runtime orchestration.

use crate::config::BridgeConfig;
use aas_eventbridge_core::{MutationEvent, ObserverRegistry};
use aas_eventbridge_mqtt::{ConnectionManager, Databus, I40MessageHandler};
use aas_eventbridge_observer::EventObserver;
use aas_eventbridge_proto::GenericMessage;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

/// The bridge runtime.
pub struct Bridge {
    config: BridgeConfig,
    connection: Arc<ConnectionManager>,
}

impl Bridge {
    /// Create a bridge with a disconnected session.
    #[must_use]
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            connection: Arc::new(ConnectionManager::new()),
        }
    }

    /// Connect, attach the observer and forward mutation events read as
    /// JSON lines from stdin until EOF or Ctrl+C.
    ///
    /// # Errors
    ///
    /// Returns error if the inbound subscription cannot be registered on an
    /// established session.
    pub async fn run(self) -> Result<()> {
        self.run_with(BufReader::new(tokio::io::stdin())).await
    }

    /// Same as [`Bridge::run`], reading events from `input`.
    ///
    /// A broker that cannot be reached does not stop the bridge: it keeps
    /// consuming events in a disconnected state and drops them.
    ///
    /// # Errors
    ///
    /// Returns error if the inbound subscription cannot be registered on an
    /// established session.
    pub async fn run_with<R>(self, input: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        tracing::info!("Starting bridge runtime");

        let mut model = ObserverRegistry::new();
        let observer = Arc::new(EventObserver::new(
            Arc::clone(&self.connection),
            self.config.scope(),
        ));
        if !self.config.whitelist.is_empty() {
            observer.set_whitelist(&self.config.whitelist);
        }

        match self.connection.connect(self.config.connection.clone()).await {
            Ok(_) => {
                let databus = Databus::with_connection(
                    Arc::clone(&self.connection),
                    &self.config.sub_topic,
                    &self.config.pub_topic,
                )
                .context("Failed to subscribe to I4.0 inbox")?;
                databus.set_handler(Arc::new(I40MessageHandler::new(
                    |topic: &str, message: GenericMessage| {
                        tracing::info!(
                            topic,
                            message_type = %message.frame.message_type,
                            conversation_id = %message.frame.conversation_id,
                            elements = message.interaction_elements.len(),
                            "Received I4.0 message"
                        );
                    },
                )));

                if let Err(err) = observer.attach(&mut model) {
                    tracing::error!(error = %err, "Failed to attach observer; events will be dropped");
                }
            }
            Err(err) => {
                tracing::error!(
                    error = %err,
                    broker = %self.config.connection.broker,
                    "Running disconnected; events will be dropped"
                );
            }
        }

        tracing::info!("Bridge running, press Ctrl+C to stop");

        let mut lines = input.lines();
        loop {
            tokio::select! {
                line = lines.next_line() => {
                    match line {
                        Ok(Some(line)) => dispatch(&model, &line),
                        Ok(None) => {
                            tracing::info!("Event input closed");
                            break;
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to read event input");
                            break;
                        }
                    }
                }

                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutdown signal received");
                    break;
                }
            }
        }

        observer.detach();
        self.connection.disconnect();
        tracing::info!("Bridge stopped");
        Ok(())
    }
}

/// Parse one JSON line and hand the event to the model's observers.
fn dispatch(model: &ObserverRegistry, line: &str) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }

    match serde_json::from_str::<MutationEvent>(line) {
        Ok(event) if model.is_empty() => {
            tracing::debug!(kind = ?event.kind(), "No observer attached; event dropped");
        }
        Ok(event) => model.notify(&event),
        Err(err) => tracing::warn!(error = %err, "Ignoring malformed mutation event"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aas_eventbridge_core::{ModelObserver, ObservableModel};
    use aas_eventbridge_mqtt::ConnectionOptions;
    use parking_lot::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct Collect(Mutex<Vec<MutationEvent>>);

    impl ModelObserver for Collect {
        fn on_event(&self, event: &MutationEvent) {
            self.0.lock().push(event.clone());
        }
    }

    #[test]
    fn dispatch_skips_blank_and_malformed_lines() {
        let collect = Arc::new(Collect::default());
        let mut model = ObserverRegistry::new();
        model.add_observer(Arc::clone(&collect) as Arc<dyn ModelObserver>);

        dispatch(&model, "");
        dispatch(&model, "{not json");
        dispatch(
            &model,
            r#"{"kind":"element_value_changed","ids":{"shellId":"S1","submodelId":"SM1"},"path":"temperature","value":25.5}"#,
        );

        let events = collect.0.lock();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].path(), Some("temperature"));
    }

    #[tokio::test]
    async fn unreachable_broker_does_not_stop_the_bridge() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let broker = format!("tcp://{}", listener.local_addr().unwrap());
        drop(listener);

        let config = BridgeConfig {
            connection: ConnectionOptions {
                connect_timeout: Duration::from_secs(2),
                ..ConnectionOptions::new(broker, "bridge-test")
            },
            ..BridgeConfig::default()
        };
        let input: &[u8] = br#"{"kind":"element_value_changed","ids":{"shellId":"urn:example:aas:1","submodelId":"SM1"},"path":"temperature","value":1}
"#;

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            Bridge::new(config).run_with(input),
        )
        .await
        .unwrap();
        assert!(result.is_ok());
    }
}
