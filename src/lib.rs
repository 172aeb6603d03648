//! Portcullis - claims-based authorization decision engine
//!
//! Given a principal (a set of identity claims), a named policy (an
//! AND-combination of requirements), and an optional resource, the engine
//! returns an allow/deny decision. Handlers registered per requirement kind
//! vote to satisfy a requirement or abstain; they combine with OR within a
//! requirement and AND across requirements, and everything fails closed.
//!
//! The engine is synchronous and stateless: the policy catalog and handler
//! registry are built once at startup and read-only afterwards, so
//! evaluations run concurrently without locking. Hosts that need async
//! interop wrap the `evaluate` call at their boundary.

pub mod claims;
pub mod engine;
pub mod errors;
pub mod handler;
pub mod loader;
pub mod policy;
pub mod registry;
pub mod requirement;
pub mod resource;
pub mod store;

pub use claims::{Claim, Identity, Principal};
pub use engine::{Clock, Decision, FixedClock, PolicyEvaluator, SystemClock};
pub use errors::AuthzError;
pub use handler::{EvaluationContext, Handler, Vote};
pub use policy::{Policy, PolicyCatalog, PolicySpec};
pub use registry::HandlerRegistry;
pub use requirement::{Requirement, RequirementKind};
pub use resource::Resource;
