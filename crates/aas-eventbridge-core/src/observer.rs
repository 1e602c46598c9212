//! Observer registration.
//!
//! The model calls its observers in-line at the moment of mutation, so an
//! observer must return promptly and must never fail the write that
//! triggered it.

use crate::event::MutationEvent;
use std::sync::Arc;

/// Receiver of model mutations.
pub trait ModelObserver: Send + Sync {
    /// Handle one mutation. Called synchronously by the model.
    fn on_event(&self, event: &MutationEvent);
}

/// A model that accepts observers.
pub trait ObservableModel {
    /// Register an observer for all future mutations.
    fn add_observer(&mut self, observer: Arc<dyn ModelObserver>);
}

/// Fan-out list of observers that a model embeds to notify them.
#[derive(Default)]
pub struct ObserverRegistry {
    observers: Vec<Arc<dyn ModelObserver>>,
}

impl ObserverRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver an event to every registered observer, in registration order.
    pub fn notify(&self, event: &MutationEvent) {
        tracing::trace!(kind = ?event.kind(), observers = self.observers.len(), "Notifying observers");
        for observer in &self.observers {
            observer.on_event(event);
        }
    }

    /// Number of registered observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Whether no observer is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl ObservableModel for ObserverRegistry {
    fn add_observer(&mut self, observer: Arc<dyn ModelObserver>) {
        self.observers.push(observer);
    }
}

impl std::fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("observers", &self.observers.len())
            .finish()
    }
}
