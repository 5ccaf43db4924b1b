/// Lifecycle marker identifying this controller's stake in an object's deletion.
///
/// While it is present in an object's finalizer set, the store must not physically remove the object.
pub const CONTROLLER_FINALIZER: &str = "edge-net.io/controller";
