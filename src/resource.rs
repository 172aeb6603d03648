use std::any::Any;

/// A domain object a resource-scoped requirement is evaluated against.
///
/// The engine treats resources as opaque: it reads only the kind tag (to
/// select resource-scoped handlers) and forwards the payload untouched.
/// Handlers downcast via [`as_any`](Resource::as_any) to their concrete
/// resource type.
pub trait Resource: Any + Send + Sync {
    /// Stable tag identifying the resource type, e.g. `"document"`.
    fn resource_kind(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;
}
