mod constants;
pub use constants::CONTROLLER_FINALIZER;

mod namespaced_name;
pub use namespaced_name::NamespacedName;

mod object_meta;
pub use object_meta::ObjectMeta;

mod object;
pub use object::Object;

mod managed_resource;
pub use managed_resource::ManagedResource;

mod request;
pub use request::ReconcileRequest;

/// Optimistic-concurrency token of a stored object.
///
/// The store bumps it on every successful write; conditional updates carry the version the caller last observed.
pub type ResourceVersion = u64;
