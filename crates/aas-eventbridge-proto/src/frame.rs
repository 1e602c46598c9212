//! I4.0 language message frame.
//!
//! The frame is the envelope of every application-level message: who sends
//! to whom, which conversation a message belongs to, and which semantic
//! protocol governs the exchange. `type`, `conversationId`, `messageId` and
//! `semanticProtocol` are mandatory; a frame lacking any of them is rejected
//! before serialization and after deserialization.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Identification of a participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantIdentification {
    /// Identifier
    pub id: String,
    /// Kind of identifier (e.g. `IRI`, `CUSTOM`)
    pub id_type: String,
}

/// Role a participant plays in the interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantRole {
    /// Role name (e.g. `InformationSender`)
    pub name: String,
}

/// Sender or receiver of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Who the participant is
    pub identification: ParticipantIdentification,
    /// Which role it plays
    pub role: ParticipantRole,
}

impl Participant {
    /// Create a participant from id, id type and role name.
    #[must_use]
    pub fn new(id: impl Into<String>, id_type: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            identification: ParticipantIdentification {
                id: id.into(),
                id_type: id_type.into(),
            },
            role: ParticipantRole { name: role.into() },
        }
    }
}

/// One typed key of a semantic protocol reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticProtocolKey {
    /// Key type (e.g. `GLOBAL_REFERENCE`)
    #[serde(rename = "type")]
    pub key_type: String,
    /// Kind of identifier in `value`
    pub id_type: String,
    /// Key value
    pub value: String,
}

/// Ordered reference identifying the interaction vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SemanticProtocol {
    /// Keys, most general first
    pub keys: Vec<SemanticProtocolKey>,
}

impl SemanticProtocol {
    /// A protocol referenced by a single global key.
    #[must_use]
    pub fn global(id_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            keys: vec![SemanticProtocolKey {
                key_type: "GLOBAL_REFERENCE".to_string(),
                id_type: id_type.into(),
                value: value.into(),
            }],
        }
    }
}

/// Envelope of an I4.0 language message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageFrame {
    /// Message kind
    #[serde(rename = "type")]
    pub message_type: String,
    /// Sending participant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<Participant>,
    /// Receiving participant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<Participant>,
    /// Groups a request/response exchange
    pub conversation_id: String,
    /// Identifier of this message; any scalar or structured value
    pub message_id: Value,
    /// Message this one answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<String>,
    /// Deadline hint for a reply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_by: Option<String>,
    /// Vocabulary of the interaction
    pub semantic_protocol: SemanticProtocol,
}

impl MessageFrame {
    /// Start building a frame.
    #[must_use]
    pub fn builder() -> MessageFrameBuilder {
        MessageFrameBuilder::default()
    }

    /// Check that every mandatory field is set.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::MissingField`] naming the first unset field.
    pub fn validate(&self) -> Result<(), FrameError> {
        if self.message_type.is_empty() {
            return Err(FrameError::MissingField("type"));
        }
        if self.conversation_id.is_empty() {
            return Err(FrameError::MissingField("conversationId"));
        }
        if self.message_id.is_null() || self.message_id.as_str() == Some("") {
            return Err(FrameError::MissingField("messageId"));
        }
        if self.semantic_protocol.keys.is_empty() {
            return Err(FrameError::MissingField("semanticProtocol"));
        }
        Ok(())
    }

    /// Validate and serialize to JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns error if a mandatory field is unset or serialization fails.
    pub fn encode(&self) -> Result<Vec<u8>, FrameError> {
        self.validate()?;
        serde_json::to_vec(self).map_err(|e| FrameError::Serialize(e.to_string()))
    }

    /// Deserialize from JSON bytes and validate.
    ///
    /// # Errors
    ///
    /// Returns error if the payload is malformed or lacks a mandatory field.
    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        let frame: Self =
            serde_json::from_slice(bytes).map_err(|e| FrameError::Format(e.to_string()))?;
        frame.validate()?;
        Ok(frame)
    }

    /// Start a reply: same conversation and protocol, participants swapped,
    /// `inReplyTo` pointing at this message.
    #[must_use]
    pub fn reply(&self) -> MessageFrameBuilder {
        let in_reply_to = match &self.message_id {
            Value::String(id) => id.clone(),
            other => other.to_string(),
        };

        MessageFrameBuilder {
            message_type: None,
            sender: self.receiver.clone(),
            receiver: self.sender.clone(),
            conversation_id: Some(self.conversation_id.clone()),
            message_id: None,
            in_reply_to: Some(in_reply_to),
            reply_by: None,
            semantic_protocol: Some(self.semantic_protocol.clone()),
        }
    }
}

/// Builder for [`MessageFrame`]; `build` enforces the mandatory fields.
#[derive(Debug, Clone, Default)]
pub struct MessageFrameBuilder {
    message_type: Option<String>,
    sender: Option<Participant>,
    receiver: Option<Participant>,
    conversation_id: Option<String>,
    message_id: Option<Value>,
    in_reply_to: Option<String>,
    reply_by: Option<String>,
    semantic_protocol: Option<SemanticProtocol>,
}

impl MessageFrameBuilder {
    /// Set the message kind.
    #[must_use]
    pub fn message_type(mut self, message_type: impl Into<String>) -> Self {
        self.message_type = Some(message_type.into());
        self
    }

    /// Set the sender.
    #[must_use]
    pub fn sender(mut self, sender: Participant) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Set the receiver.
    #[must_use]
    pub fn receiver(mut self, receiver: Participant) -> Self {
        self.receiver = Some(receiver);
        self
    }

    /// Set the conversation id.
    #[must_use]
    pub fn conversation_id(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    /// Start a fresh conversation with a random id.
    #[must_use]
    pub fn new_conversation(self) -> Self {
        self.conversation_id(Uuid::new_v4().to_string())
    }

    /// Set the message id.
    #[must_use]
    pub fn message_id(mut self, message_id: impl Into<Value>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }

    /// Set the id of the message being answered.
    #[must_use]
    pub fn in_reply_to(mut self, in_reply_to: impl Into<String>) -> Self {
        self.in_reply_to = Some(in_reply_to.into());
        self
    }

    /// Set the reply deadline hint.
    #[must_use]
    pub fn reply_by(mut self, reply_by: impl Into<String>) -> Self {
        self.reply_by = Some(reply_by.into());
        self
    }

    /// Set the semantic protocol.
    #[must_use]
    pub fn semantic_protocol(mut self, semantic_protocol: SemanticProtocol) -> Self {
        self.semantic_protocol = Some(semantic_protocol);
        self
    }

    /// Build and validate the frame.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::MissingField`] if a mandatory field was not set.
    pub fn build(self) -> Result<MessageFrame, FrameError> {
        let frame = MessageFrame {
            message_type: self.message_type.ok_or(FrameError::MissingField("type"))?,
            sender: self.sender,
            receiver: self.receiver,
            conversation_id: self
                .conversation_id
                .ok_or(FrameError::MissingField("conversationId"))?,
            message_id: self
                .message_id
                .ok_or(FrameError::MissingField("messageId"))?,
            in_reply_to: self.in_reply_to,
            reply_by: self.reply_by,
            semantic_protocol: self
                .semantic_protocol
                .ok_or(FrameError::MissingField("semanticProtocol"))?,
        };
        frame.validate()?;
        Ok(frame)
    }
}

/// Errors of the frame codec.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// A mandatory field is unset
    #[error("missing mandatory field: {0}")]
    MissingField(&'static str),
    /// Serialization failed
    #[error("serialization failed: {0}")]
    Serialize(String),
    /// The payload is not a well-formed frame
    #[error("malformed frame: {0}")]
    Format(String),
}
