use std::collections::HashMap;
use std::sync::Arc;

use crate::handler::{ClaimValueHandler, Handler, RoleHandler};
use crate::requirement::RequirementKind;

/// Process-wide mapping of requirement kind (optionally paired with a
/// resource kind) to the ordered handlers that may satisfy it.
///
/// Built once during single-threaded startup; read-only afterwards, so
/// evaluations on any number of threads can look handlers up without
/// locking. Multiple handlers under one key are the OR mechanism within a
/// single requirement.
#[derive(Default)]
pub struct HandlerRegistry {
    /// (requirement kind, resource kind | none) -> handlers in
    /// registration order
    handlers: HashMap<(RequirementKind, Option<String>), Vec<Arc<dyn Handler>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the shortcut-check handlers (role and claim value)
    /// already in place.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(RequirementKind::Role, Arc::new(RoleHandler));
        registry.register(RequirementKind::Claim, Arc::new(ClaimValueHandler));
        registry
    }

    /// Register a handler for a requirement kind, applicable whether or not
    /// a resource is supplied. Startup-time only.
    pub fn register(&mut self, kind: RequirementKind, handler: Arc<dyn Handler>) {
        self.handlers.entry((kind, None)).or_default().push(handler);
    }

    /// Register a handler that only applies when a resource of the given
    /// kind accompanies the evaluation. Startup-time only.
    pub fn register_for_resource(
        &mut self,
        kind: RequirementKind,
        resource_kind: impl Into<String>,
        handler: Arc<dyn Handler>,
    ) {
        self.handlers
            .entry((kind, Some(resource_kind.into())))
            .or_default()
            .push(handler);
    }

    /// All handlers applicable to the requirement kind: the kind-global
    /// handlers first, then the ones scoped to the supplied resource kind.
    /// Resource-scoped handlers are never yielded without a matching
    /// resource.
    pub fn handlers_for(
        &self,
        kind: RequirementKind,
        resource_kind: Option<&str>,
    ) -> impl Iterator<Item = &Arc<dyn Handler>> {
        let global = self.handlers.get(&(kind, None));
        let scoped = resource_kind.and_then(|rk| self.handlers.get(&(kind, Some(rk.to_string()))));
        global
            .into_iter()
            .flatten()
            .chain(scoped.into_iter().flatten())
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.values().map(|v| v.len()).sum()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.handler_count())
            .finish()
    }
}
