use aas_eventbridge_mqtt::{
    ConnectOutcome, ConnectionManager, ConnectionOptions, Databus, I40MessageHandler,
};
use aas_eventbridge_proto::{GenericMessage, MessageFrame, Participant, SemanticProtocol};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use uuid::Uuid;

fn broker() -> Option<String> {
    if std::env::var("EVENTBRIDGE_INTEGRATION").is_err() {
        eprintln!("Skipping integration test; set EVENTBRIDGE_INTEGRATION=1 to run");
        return None;
    }
    Some(
        std::env::var("EVENTBRIDGE_MQTT_BROKER")
            .unwrap_or_else(|_| "tcp://localhost:1883".to_string()),
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn databus_roundtrip() {
    let Some(broker) = broker() else {
        return;
    };
    let topic = format!("integration/{}", Uuid::new_v4());

    let (tx, mut rx) = mpsc::unbounded_channel();
    let receiver = Databus::init(
        ConnectionOptions::new(broker.clone(), format!("sub-{}", Uuid::new_v4())),
        topic.clone(),
        "integration/unused",
    )
    .await
    .unwrap();
    receiver.set_handler(Arc::new(I40MessageHandler::new(
        move |_topic: &str, message: GenericMessage| {
            let _ = tx.send(message);
        },
    )));

    let sender = Databus::init(
        ConnectionOptions::new(broker, format!("pub-{}", Uuid::new_v4())),
        format!("integration/{}", Uuid::new_v4()),
        topic,
    )
    .await
    .unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;

    let frame = MessageFrame::builder()
        .message_type("TEST_MESSAGE")
        .receiver(Participant::new("TEST_RECEIVER", "CUSTOM", "InformationReceiver"))
        .new_conversation()
        .message_id(0)
        .semantic_protocol(SemanticProtocol::global("CUSTOM", "TEST_PROTOCOL"))
        .build()
        .unwrap();
    let message = GenericMessage::new(frame, Vec::new());
    assert!(sender.publish(&message));

    let received = timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timeout waiting for MQTT message")
        .expect("handler dropped");

    assert_eq!(received, message);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn repeated_connect_is_idempotent() {
    let Some(broker) = broker() else {
        return;
    };

    let manager = ConnectionManager::new();
    let options = ConnectionOptions::new(broker, format!("idem-{}", Uuid::new_v4()));

    assert_eq!(
        manager.connect(options.clone()).await.unwrap(),
        ConnectOutcome::Connected
    );
    assert_eq!(
        manager.connect(options).await.unwrap(),
        ConnectOutcome::AlreadyConnected
    );

    manager.disconnect();
    assert!(!manager.is_connected());
}
