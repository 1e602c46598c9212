//! Payload construction for published events.
//!
//! | Event | Payload |
//! |---|---|
//! | submodel added/removed | `(shell_id,submodel_id)` |
//! | element added/removed/updated | element JSON with `"value": null` |
//! | element value changed | raw value JSON |

use aas_eventbridge_core::MutationEvent;

/// Combined identifier tuple for coarse, entity-scoped events.
#[must_use]
pub fn combined_message(shell_id: &str, submodel_id: &str) -> String {
    format!("({shell_id},{submodel_id})")
}

/// Build the payload for a mutation event.
///
/// Structural element events carry a redacted snapshot so that values only
/// travel on value topics.
///
/// # Errors
///
/// Returns error if the snapshot or value cannot be serialized.
pub fn event_payload(event: &MutationEvent) -> Result<Vec<u8>, PayloadError> {
    match event {
        MutationEvent::SubmodelAdded { ids } | MutationEvent::SubmodelRemoved { ids } => {
            Ok(combined_message(&ids.shell_id, &ids.submodel_id).into_bytes())
        }
        MutationEvent::ElementAdded { element, .. }
        | MutationEvent::ElementRemoved { element, .. }
        | MutationEvent::ElementUpdated { element, .. } => serde_json::to_vec(&element.redacted())
            .map_err(|e| PayloadError::Serialize(e.to_string())),
        MutationEvent::ElementValueChanged { value, .. } => {
            serde_json::to_vec(value).map_err(|e| PayloadError::Serialize(e.to_string()))
        }
    }
}

/// Payload construction errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    /// Serialization failed
    #[error("serialize error: {0}")]
    Serialize(String),
}
