use crate::{NamespacedName, ObjectMeta};

/// A stored object the controller can reconcile.
///
/// `Clone` is the working-copy mechanism: callers clone what the store handed out and mutate only the clone.
pub trait Object: Clone + Send + Sync + 'static {
    fn meta(&self) -> &ObjectMeta;
    fn meta_mut(&mut self) -> &mut ObjectMeta;

    fn id(&self) -> NamespacedName {
        self.meta().id()
    }
}
