//! Mutation events emitted by an observable AAS model.
//!
//! One closed event type replaces per-API-version observer interfaces:
//! every callback the model can raise is a variant of [`MutationEvent`] and
//! consumers dispatch with a single `match`.

use crate::element::SubmodelElement;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifiers of the entity that owns a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityIds {
    /// Asset shell identifier
    pub shell_id: String,
    /// Submodel identifier
    pub submodel_id: String,
    /// Repository hosting the shell, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_id: Option<String>,
}

impl EntityIds {
    /// Create identifiers without a repository.
    #[must_use]
    pub fn new(shell_id: impl Into<String>, submodel_id: impl Into<String>) -> Self {
        Self {
            shell_id: shell_id.into(),
            submodel_id: submodel_id.into(),
            repo_id: None,
        }
    }

    /// Attach a repository identifier.
    #[must_use]
    pub fn in_repo(mut self, repo_id: impl Into<String>) -> Self {
        self.repo_id = Some(repo_id.into());
        self
    }
}

/// Kind of a mutation, without its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A submodel was added to a shell
    SubmodelAdded,
    /// A submodel was removed from a shell
    SubmodelRemoved,
    /// An element was created
    ElementAdded,
    /// An element was deleted
    ElementRemoved,
    /// An element was replaced
    ElementUpdated,
    /// Only the value of an element changed
    ElementValueChanged,
}

impl EventKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::SubmodelAdded,
        Self::SubmodelRemoved,
        Self::ElementAdded,
        Self::ElementRemoved,
        Self::ElementUpdated,
        Self::ElementValueChanged,
    ];

    /// Whether the event addresses a single element (and is subject to filtering).
    #[must_use]
    pub fn is_element_scoped(self) -> bool {
        !matches!(self, Self::SubmodelAdded | Self::SubmodelRemoved)
    }
}

/// A structural or value mutation of the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MutationEvent {
    /// A submodel was added to a shell
    SubmodelAdded {
        /// Owning identifiers
        ids: EntityIds,
    },
    /// A submodel was removed from a shell
    SubmodelRemoved {
        /// Owning identifiers
        ids: EntityIds,
    },
    /// An element was created
    ElementAdded {
        /// Owning identifiers
        ids: EntityIds,
        /// idShortPath of the element
        path: String,
        /// Snapshot of the new element
        element: SubmodelElement,
    },
    /// An element was deleted
    ElementRemoved {
        /// Owning identifiers
        ids: EntityIds,
        /// idShortPath of the element
        path: String,
        /// Snapshot of the element before deletion
        element: SubmodelElement,
    },
    /// An element was replaced
    ElementUpdated {
        /// Owning identifiers
        ids: EntityIds,
        /// idShortPath of the element
        path: String,
        /// Snapshot of the element after the update
        element: SubmodelElement,
    },
    /// The value of an element changed
    ElementValueChanged {
        /// Owning identifiers
        ids: EntityIds,
        /// idShortPath of the element
        path: String,
        /// The new raw value
        value: Value,
    },
}

impl MutationEvent {
    /// The kind of this event.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::SubmodelAdded { .. } => EventKind::SubmodelAdded,
            Self::SubmodelRemoved { .. } => EventKind::SubmodelRemoved,
            Self::ElementAdded { .. } => EventKind::ElementAdded,
            Self::ElementRemoved { .. } => EventKind::ElementRemoved,
            Self::ElementUpdated { .. } => EventKind::ElementUpdated,
            Self::ElementValueChanged { .. } => EventKind::ElementValueChanged,
        }
    }

    /// Owning identifiers.
    #[must_use]
    pub fn ids(&self) -> &EntityIds {
        match self {
            Self::SubmodelAdded { ids }
            | Self::SubmodelRemoved { ids }
            | Self::ElementAdded { ids, .. }
            | Self::ElementRemoved { ids, .. }
            | Self::ElementUpdated { ids, .. }
            | Self::ElementValueChanged { ids, .. } => ids,
        }
    }

    /// Element path, for element-scoped events.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::SubmodelAdded { .. } | Self::SubmodelRemoved { .. } => None,
            Self::ElementAdded { path, .. }
            | Self::ElementRemoved { path, .. }
            | Self::ElementUpdated { path, .. }
            | Self::ElementValueChanged { path, .. } => Some(path),
        }
    }
}
