use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::claims::Principal;
use crate::errors::AuthzError;
use crate::handler::{EvaluationContext, Vote};
use crate::policy::PolicyCatalog;
use crate::registry::HandlerRegistry;
use crate::requirement::Requirement;
use crate::resource::Resource;

/// Source of the current instant, injectable so tests can pin the clock
/// for age and expiry checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time. The default.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a fixed instant, for tests.
#[derive(Debug)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// The outcome of one evaluation. Produced fresh per call and never cached;
/// claims and resource state can change between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Decision {
    succeeded: bool,
}

impl Decision {
    fn success() -> Self {
        Self { succeeded: true }
    }

    fn failure() -> Self {
        Self { succeeded: false }
    }

    pub fn succeeded(&self) -> bool {
        self.succeeded
    }
}

/// The decision engine: evaluates a principal against a named policy,
/// optionally scoped to a resource.
///
/// Stateless over its inputs once built. The catalog and registry are
/// read-only after startup, so one evaluator serves any number of
/// concurrent evaluations without locking.
pub struct PolicyEvaluator {
    catalog: PolicyCatalog,
    registry: HandlerRegistry,
    clock: Arc<dyn Clock>,
}

impl PolicyEvaluator {
    pub fn new(catalog: PolicyCatalog, registry: HandlerRegistry) -> Self {
        Self::with_clock(catalog, registry, Arc::new(SystemClock))
    }

    pub fn with_clock(
        catalog: PolicyCatalog,
        registry: HandlerRegistry,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            catalog,
            registry,
            clock,
        }
    }

    pub fn catalog(&self) -> &PolicyCatalog {
        &self.catalog
    }

    /// Decide whether `principal` satisfies the named policy.
    ///
    /// Requirements combine with AND; handlers for one requirement combine
    /// with OR (first Succeed wins, in registration order). A requirement
    /// with no registered handler fails closed. An unknown policy name is a
    /// wiring bug and surfaces as a hard error, never as a denial.
    pub fn evaluate(
        &self,
        principal: &Principal,
        policy_name: &str,
        resource: Option<&dyn Resource>,
    ) -> Result<Decision, AuthzError> {
        let policy = self
            .catalog
            .get(policy_name)
            .ok_or_else(|| AuthzError::UnknownPolicy(policy_name.to_string()))?;

        if policy.requires_authenticated_principal() && !principal.is_authenticated() {
            tracing::debug!(policy = policy_name, "denied: principal not authenticated");
            return Ok(Decision::failure());
        }

        let cx = EvaluationContext {
            principal,
            resource,
            now: self.clock.now(),
        };

        for requirement in policy.requirements() {
            if !self.requirement_satisfied(&cx, requirement, policy_name) {
                tracing::debug!(
                    policy = policy_name,
                    requirement = %requirement.kind(),
                    "denied: requirement not satisfied"
                );
                return Ok(Decision::failure());
            }
        }

        tracing::debug!(policy = policy_name, "granted");
        Ok(Decision::success())
    }

    fn requirement_satisfied(
        &self,
        cx: &EvaluationContext<'_>,
        requirement: &Requirement,
        policy_name: &str,
    ) -> bool {
        let kind = requirement.kind();
        let resource_kind = cx.resource.map(|r| r.resource_kind());

        let mut handlers_seen = false;
        for handler in self.registry.handlers_for(kind, resource_kind) {
            handlers_seen = true;
            if handler.evaluate(cx, requirement) == Vote::Succeed {
                return true;
            }
        }

        if !handlers_seen {
            // A denial caused by wiring, not by the principal's claims.
            tracing::warn!(
                policy = policy_name,
                requirement = %kind,
                "no handler registered for requirement; denying (fail-closed)"
            );
        }
        false
    }
}
