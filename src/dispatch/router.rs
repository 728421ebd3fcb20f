//! Event router tying the waiter registry into a host handler chain.

use crate::error::{Result, WaitError};
use crate::types::{EventKind, SubjectId, SubjectRef};
use crate::waiters::{EventFilter, WaitOptions, WaiterRegistry};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// Extracts the subject id from an event of a given kind.
///
/// Kinds differ in where the subject lives in the payload, so the host
/// supplies one extractor per kind. Returning `None` means the event has no
/// subject and cannot resolve a wait.
pub type SubjectExtractor<E> = Arc<dyn Fn(&E) -> Option<SubjectId> + Send + Sync>;

/// Handler invoked for every routed event of its kind.
#[async_trait]
pub trait EventHandler<E>: Send + Sync {
    /// Process a routed event. `subject` is present when the kind has an
    /// extractor and it produced an id.
    async fn handle(&self, subject: Option<SubjectId>, event: &E);
}

/// Resolves higher-level subject references to registry keys.
#[async_trait]
pub trait SubjectResolver: Send + Sync {
    /// Resolve `subject` to its numeric id.
    async fn resolve(&self, subject: &SubjectRef) -> Result<SubjectId>;
}

/// Outcome of dispatching one inbound event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Whether a pending wait was resolved by this event.
    pub resolved_wait: bool,
    /// Number of handlers that accepted and processed the event.
    pub handlers_run: usize,
}

struct HandlerEntry<E> {
    handler: Arc<dyn EventHandler<E>>,
    /// Handler-level acceptance filter, consulted only when a subject was
    /// extracted for the event.
    filter: Option<Arc<dyn EventFilter<E>>>,
}

/// Routes classified inbound events: consults the waiter registry first,
/// then runs the normal handler chain. Resolving a wait never suppresses
/// routing to handlers.
///
/// The router owns one explicitly constructed registry; there is no global
/// instance. Hosts that keep their own registry can share it via
/// [`EventRouter::with_registry`].
pub struct EventRouter<E> {
    registry: Arc<WaiterRegistry<E>>,
    extractors: RwLock<HashMap<EventKind, SubjectExtractor<E>>>,
    handlers: RwLock<HashMap<EventKind, Vec<HandlerEntry<E>>>>,
    resolver: Option<Arc<dyn SubjectResolver>>,
}

impl<E> EventRouter<E>
where
    E: Clone + Send + Sync + 'static,
{
    /// Create a router with its own empty registry.
    pub fn new() -> Self {
        Self::with_registry(Arc::new(WaiterRegistry::new()))
    }

    /// Build a router around an existing registry.
    pub fn with_registry(registry: Arc<WaiterRegistry<E>>) -> Self {
        Self {
            registry,
            extractors: RwLock::new(HashMap::new()),
            handlers: RwLock::new(HashMap::new()),
            resolver: None,
        }
    }

    /// Attach a resolver for symbolic subject references.
    pub fn with_resolver(mut self, resolver: Arc<dyn SubjectResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Shared handle to the underlying registry.
    pub fn registry(&self) -> &Arc<WaiterRegistry<E>> {
        &self.registry
    }

    // --- Configuration ---

    /// Install the subject extractor for `kind`, replacing any previous
    /// one.
    pub fn set_extractor<F>(&self, kind: EventKind, extractor: F)
    where
        F: Fn(&E) -> Option<SubjectId> + Send + Sync + 'static,
    {
        self.extractors.write().insert(kind, Arc::new(extractor));
    }

    /// Append a handler to the chain for `kind`.
    pub fn add_handler(&self, kind: EventKind, handler: Arc<dyn EventHandler<E>>) {
        self.handlers.write().entry(kind).or_default().push(HandlerEntry {
            handler,
            filter: None,
        });
    }

    /// Append a handler gated by its own acceptance filter.
    pub fn add_handler_with_filter(
        &self,
        kind: EventKind,
        handler: Arc<dyn EventHandler<E>>,
        filter: Arc<dyn EventFilter<E>>,
    ) {
        self.handlers.write().entry(kind).or_default().push(HandlerEntry {
            handler,
            filter: Some(filter),
        });
    }

    // --- Waiting ---

    /// Suspend until an event matching (subject, kind) arrives.
    pub async fn wait_for(
        &self,
        subject: SubjectId,
        kind: EventKind,
        options: WaitOptions<E>,
    ) -> Result<E> {
        self.registry.register_wait(subject, kind, options).await
    }

    /// Suspend until an event matching the resolved reference arrives.
    pub async fn wait_for_ref(
        &self,
        subject: &SubjectRef,
        kind: EventKind,
        options: WaitOptions<E>,
    ) -> Result<E> {
        let subject = self.resolve_subject(subject).await?;
        self.registry.register_wait(subject, kind, options).await
    }

    /// Cancel the pending wait for (subject, kind), if any.
    pub fn cancel_wait(&self, subject: SubjectId, kind: EventKind) -> bool {
        self.registry.cancel_wait(subject, kind)
    }

    /// Resolve a subject reference to a registry key.
    pub async fn resolve_subject(&self, subject: &SubjectRef) -> Result<SubjectId> {
        match subject {
            SubjectRef::Id(id) => Ok(SubjectId(*id)),
            SubjectRef::Name(name) => match &self.resolver {
                Some(resolver) => resolver.resolve(subject).await,
                None => Err(WaitError::UnknownSubject(name.clone())),
            },
        }
    }

    // --- Dispatch ---

    /// Dispatch one classified inbound event.
    ///
    /// The waiter registry is consulted first; the handler chain then runs
    /// regardless of whether a wait was resolved. Filter failures (waiter
    /// or handler level) propagate; a broken predicate is a host bug, not
    /// a silent non-match.
    pub async fn dispatch(&self, kind: EventKind, event: E) -> Result<DispatchOutcome> {
        let subject = {
            let extractors = self.extractors.read();
            extractors.get(&kind).and_then(|extract| extract(&event))
        };

        let resolved_wait = match subject {
            Some(subject) => self.registry.on_event(subject, kind, &event).await?,
            None => {
                trace!(kind = %kind, "No subject extracted; skipping wait resolution");
                false
            }
        };

        let entries: Vec<(Arc<dyn EventHandler<E>>, Option<Arc<dyn EventFilter<E>>>)> = {
            let handlers = self.handlers.read();
            handlers
                .get(&kind)
                .map(|chain| {
                    chain
                        .iter()
                        .map(|entry| (Arc::clone(&entry.handler), entry.filter.clone()))
                        .collect()
                })
                .unwrap_or_default()
        };

        let mut handlers_run = 0;
        for (handler, filter) in entries {
            if let Some(filter) = filter {
                let Some(subject) = subject else {
                    // A filtered handler needs a subject to evaluate
                    // against; skip it for subjectless events.
                    trace!(kind = %kind, "Skipping filtered handler without subject");
                    continue;
                };
                if !filter.check(subject, &event).await? {
                    continue;
                }
            }
            handler.handle(subject, &event).await;
            handlers_run += 1;
        }

        if resolved_wait {
            debug!(kind = %kind, handlers_run, "Event resolved a wait and was routed");
        }

        Ok(DispatchOutcome {
            resolved_wait,
            handlers_run,
        })
    }
}

impl<E> Default for EventRouter<E>
where
    E: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
