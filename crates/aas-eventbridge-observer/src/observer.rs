//! Event observer state machine.
//!
//! ```text
//! Unattached --attach--> Attached --detach--> Detached
//! ```
//!
//! Attaching publishes a "created" announcement for the observed scope and
//! then registers with the model. Only an attached observer publishes.
//! Detaching is terminal.

use crate::payload::{combined_message, event_payload};
use aas_eventbridge_core::{
    EntityIds, FilterPolicy, ModelObserver, MutationEvent, ObservableModel,
};
use aas_eventbridge_mqtt::{PublishError, Publisher, QoS};
use aas_eventbridge_proto::{TopicScheme, DEFAULT_REPOSITORY};
use parking_lot::Mutex;
use std::sync::Arc;

/// Lifecycle state of an [`EventObserver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverState {
    /// Created, not yet registered
    Unattached,
    /// Registered and publishing
    Attached,
    /// Shut down; ignores all events
    Detached,
}

/// The part of the model an observer is responsible for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObserverScope {
    /// Repository segment used in topics
    pub repo_id: String,
    /// Observed shell
    pub shell_id: String,
    /// Observed submodel; `None` observes the whole shell
    pub submodel_id: Option<String>,
}

impl ObserverScope {
    /// Observe every submodel of a shell.
    #[must_use]
    pub fn shell(shell_id: impl Into<String>) -> Self {
        Self {
            repo_id: DEFAULT_REPOSITORY.to_string(),
            shell_id: shell_id.into(),
            submodel_id: None,
        }
    }

    /// Observe one submodel of a shell.
    #[must_use]
    pub fn submodel(shell_id: impl Into<String>, submodel_id: impl Into<String>) -> Self {
        Self {
            submodel_id: Some(submodel_id.into()),
            ..Self::shell(shell_id)
        }
    }

    /// Set the repository.
    #[must_use]
    pub fn in_repo(mut self, repo_id: impl Into<String>) -> Self {
        self.repo_id = repo_id.into();
        self
    }

    fn contains(&self, ids: &EntityIds) -> bool {
        ids.shell_id == self.shell_id
            && self
                .submodel_id
                .as_ref()
                .map_or(true, |submodel| *submodel == ids.submodel_id)
            && ids
                .repo_id
                .as_ref()
                .map_or(true, |repo| *repo == self.repo_id)
    }
}

/// Publishes model mutations of one scope to the broker.
pub struct EventObserver<P: Publisher> {
    publisher: Arc<P>,
    scope: ObserverScope,
    topics: TopicScheme,
    filter: Arc<FilterPolicy>,
    state: Mutex<ObserverState>,
}

impl<P: Publisher + 'static> EventObserver<P> {
    /// Create an unattached observer with filtering disabled.
    #[must_use]
    pub fn new(publisher: Arc<P>, scope: ObserverScope) -> Self {
        Self::with_filter(publisher, scope, Arc::new(FilterPolicy::new()))
    }

    /// Create an unattached observer sharing a filter policy.
    #[must_use]
    pub fn with_filter(publisher: Arc<P>, scope: ObserverScope, filter: Arc<FilterPolicy>) -> Self {
        Self {
            publisher,
            topics: TopicScheme::new(scope.repo_id.clone()),
            scope,
            filter,
            state: Mutex::new(ObserverState::Unattached),
        }
    }

    /// Announce the scope and register with `model`.
    ///
    /// A shell scope announces the shell id; a submodel scope announces
    /// `(shell,submodel)`. The observer stays unattached if the
    /// announcement cannot be published.
    ///
    /// # Errors
    ///
    /// Returns error if the observer is not unattached or the announcement
    /// fails.
    pub fn attach<M>(self: &Arc<Self>, model: &mut M) -> Result<(), AttachError>
    where
        M: ObservableModel + ?Sized,
    {
        {
            let mut state = self.state.lock();
            match *state {
                ObserverState::Unattached => {}
                ObserverState::Attached => return Err(AttachError::AlreadyAttached),
                ObserverState::Detached => return Err(AttachError::Detached),
            }

            let (topic, payload) = self.announcement();
            self.publisher
                .publish(&topic, payload.into_bytes(), QoS::AtLeastOnce, false)
                .map_err(AttachError::Announce)?;
            *state = ObserverState::Attached;
        }

        // The model may deliver events while registering.
        model.add_observer(Arc::clone(self) as Arc<dyn ModelObserver>);

        tracing::info!(
            shell_id = %self.scope.shell_id,
            submodel_id = ?self.scope.submodel_id,
            repo_id = %self.scope.repo_id,
            "Observer attached"
        );
        Ok(())
    }

    /// Stop publishing. Publishes already in flight are not cancelled.
    pub fn detach(&self) {
        let mut state = self.state.lock();
        if *state != ObserverState::Detached {
            *state = ObserverState::Detached;
            tracing::info!(shell_id = %self.scope.shell_id, "Observer detached");
        }
    }

    fn announcement(&self) -> (String, String) {
        let repo = Some(self.scope.repo_id.as_str());
        match &self.scope.submodel_id {
            None => (
                self.topics.shell_created(repo),
                self.scope.shell_id.clone(),
            ),
            Some(submodel_id) => (
                self.topics.submodel_created(&self.scope.shell_id, repo),
                combined_message(&self.scope.shell_id, submodel_id),
            ),
        }
    }
}

impl<P: Publisher> EventObserver<P> {
    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ObserverState {
        *self.state.lock()
    }

    /// Observed scope.
    #[must_use]
    pub fn scope(&self) -> &ObserverScope {
        &self.scope
    }

    /// The filter policy applied to element events.
    #[must_use]
    pub fn filter(&self) -> &Arc<FilterPolicy> {
        &self.filter
    }

    /// Replace the whitelist and enable filtering.
    pub fn set_whitelist<I, S>(&self, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.filter.set_whitelist(paths);
        self.filter.enable();
    }

    /// Add one path to the whitelist.
    pub fn add_whitelisted_path(&self, path: &str) {
        self.filter.add_path(path);
    }

    /// Turn whitelist filtering on.
    pub fn use_whitelist(&self) {
        self.filter.enable();
    }

    /// Turn whitelist filtering off; every element event passes.
    pub fn disable_whitelist(&self) {
        self.filter.disable();
    }
}

impl<P: Publisher> ModelObserver for EventObserver<P> {
    fn on_event(&self, event: &MutationEvent) {
        if *self.state.lock() != ObserverState::Attached {
            return;
        }

        let ids = event.ids();
        if !self.scope.contains(ids) {
            tracing::trace!(shell_id = %ids.shell_id, submodel_id = %ids.submodel_id, "Event outside observed scope");
            return;
        }

        let kind = event.kind();
        let path = event.path();
        if kind.is_element_scoped() {
            let path = path.unwrap_or_default();
            if !self.filter.passes(path) {
                tracing::debug!(path, ?kind, "Element not whitelisted; event suppressed");
                return;
            }
        }

        let payload = match event_payload(event) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(error = %err, ?kind, "Dropping event with unserializable payload");
                return;
            }
        };

        let topic = self.topics.for_event(kind, ids, path);
        tracing::debug!(topic = %topic, payload_len = payload.len(), ?kind, "Publishing event");
        if let Err(err) = self
            .publisher
            .publish(&topic, payload, QoS::AtLeastOnce, false)
        {
            tracing::warn!(error = %err, topic = %topic, "Could not publish event");
        }
    }
}

/// Errors of [`EventObserver::attach`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttachError {
    /// The observer is already registered
    #[error("observer already attached")]
    AlreadyAttached,
    /// The observer was shut down
    #[error("observer detached")]
    Detached,
    /// The "created" announcement could not be published
    #[error("announcement failed: {0}")]
    Announce(PublishError),
}
