//! Submodel element snapshots.
//!
//! The bridge never owns the AAS model; it only receives JSON snapshots of
//! elements at the moment they change. A snapshot keeps every attribute of
//! the element verbatim and exposes the scalar `value` separately so that it
//! can be redacted before a structural event is published.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Snapshot of a submodel element as delivered by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmodelElement {
    /// Short identifier of the element
    pub id_short: String,
    /// Current value. `None` serializes as an explicit `null`.
    #[serde(default)]
    pub value: Option<Value>,
    /// All remaining attributes (modelType, semanticId, valueType, ...)
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl SubmodelElement {
    /// Create a snapshot with the given idShort and value and no further attributes.
    #[must_use]
    pub fn new(id_short: impl Into<String>, value: Option<Value>) -> Self {
        Self {
            id_short: id_short.into(),
            value,
            attributes: Map::new(),
        }
    }

    /// Add an attribute, replacing any previous one with the same key.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Parse a snapshot from a JSON element representation.
    ///
    /// # Errors
    ///
    /// Returns error if the JSON is not an object with an `idShort`.
    pub fn from_json(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Return a copy with the value cleared to the explicit absent marker.
    ///
    /// The snapshot itself is left untouched.
    #[must_use]
    pub fn redacted(&self) -> Self {
        Self {
            value: None,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temperature() -> SubmodelElement {
        SubmodelElement::from_json(json!({
            "idShort": "temperature",
            "modelType": "Property",
            "valueType": "xs:double",
            "value": 25.5
        }))
        .unwrap()
    }

    #[test]
    fn parses_attributes_and_value() {
        let element = temperature();
        assert_eq!(element.id_short, "temperature");
        assert_eq!(element.value, Some(json!(25.5)));
        assert_eq!(element.attributes.get("modelType"), Some(&json!("Property")));
    }

    #[test]
    fn redaction_clears_value_on_copy_only() {
        let element = temperature();
        let redacted = element.redacted();

        assert_eq!(redacted.value, None);
        assert_eq!(redacted.attributes, element.attributes);
        assert_eq!(element.value, Some(json!(25.5)));
    }

    #[test]
    fn redacted_value_serializes_as_null() {
        let json = serde_json::to_value(temperature().redacted()).unwrap();
        assert_eq!(json["value"], Value::Null);
        assert_eq!(json["valueType"], json!("xs:double"));
    }

    #[test]
    fn missing_value_defaults_to_none() {
        let element = SubmodelElement::from_json(json!({
            "idShort": "Collection",
            "modelType": "SubmodelElementCollection"
        }))
        .unwrap();
        assert!(element.value.is_none());
    }
}
