//! I4.0 language messages.
//!
//! A message is a validated [`MessageFrame`] plus a list of interaction
//! elements (free-form maps, submodel elements, whole submodels...).

use crate::frame::{FrameError, MessageFrame};
use aas_eventbridge_core::SubmodelElement;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A frame and its interaction elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct I40Message<T> {
    /// Envelope
    pub frame: MessageFrame,
    /// Payload of the interaction
    #[serde(default = "Vec::new")]
    pub interaction_elements: Vec<T>,
}

/// Message carrying free-form key/value interaction elements.
pub type GenericMessage = I40Message<Map<String, Value>>;

/// Message carrying submodel elements.
pub type SubmodelElementMessage = I40Message<SubmodelElement>;

impl<T> I40Message<T> {
    /// Create a message.
    #[must_use]
    pub fn new(frame: MessageFrame, interaction_elements: Vec<T>) -> Self {
        Self {
            frame,
            interaction_elements,
        }
    }
}

impl<T: Serialize> I40Message<T> {
    /// Validate the frame and serialize to JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns error if the frame is invalid or serialization fails.
    pub fn to_json(&self) -> Result<Vec<u8>, FrameError> {
        self.frame.validate()?;
        serde_json::to_vec(self).map_err(|e| FrameError::Serialize(e.to_string()))
    }
}

impl<T: DeserializeOwned> I40Message<T> {
    /// Deserialize from JSON bytes and validate the frame.
    ///
    /// # Errors
    ///
    /// Returns error if the payload is malformed or the frame is invalid.
    pub fn from_json(bytes: &[u8]) -> Result<Self, FrameError> {
        let message: Self =
            serde_json::from_slice(bytes).map_err(|e| FrameError::Format(e.to_string()))?;
        message.frame.validate()?;
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Participant, SemanticProtocol};
    use serde_json::json;

    fn frame() -> MessageFrame {
        MessageFrame::builder()
            .message_type("TEST_MESSAGE")
            .receiver(Participant::new("TEST_RECEIVER", "CUSTOM", "InformationReceiver"))
            .new_conversation()
            .message_id(0)
            .semantic_protocol(SemanticProtocol::global("CUSTOM", "TEST_PROTOCOL"))
            .build()
            .unwrap()
    }

    #[test]
    fn generic_message_roundtrip() {
        let mut elements = Map::new();
        elements.insert("interactionElement1".to_string(), json!("Bob"));
        elements.insert("interactionElement2".to_string(), json!("Eve"));
        let message = GenericMessage::new(frame(), vec![elements]);

        let bytes = message.to_json().unwrap();
        let decoded = GenericMessage::from_json(&bytes).unwrap();

        assert_eq!(decoded, message);
    }

    #[test]
    fn submodel_element_message_keeps_values() {
        let element = SubmodelElement::new("OperatingManual", Some(json!("manual.pdf")))
            .with_attribute("modelType", json!("File"));
        let message = SubmodelElementMessage::new(frame(), vec![element.clone()]);

        let decoded = SubmodelElementMessage::from_json(&message.to_json().unwrap()).unwrap();
        assert_eq!(decoded.interaction_elements, vec![element]);
    }

    #[test]
    fn invalid_frame_is_not_serialized() {
        let mut message = GenericMessage::new(frame(), Vec::new());
        message.frame.message_type.clear();
        assert_eq!(message.to_json(), Err(FrameError::MissingField("type")));
    }

    #[test]
    fn wire_shape() {
        let json: Value =
            serde_json::from_slice(&GenericMessage::new(frame(), Vec::new()).to_json().unwrap())
                .unwrap();
        assert!(json["frame"].is_object());
        assert_eq!(json["interactionElements"], json!([]));
    }
}
