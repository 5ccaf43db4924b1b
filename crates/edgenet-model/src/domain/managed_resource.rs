use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{NamespacedName, Object, ObjectMeta};

/// Generic managed resource with opaque spec and status payloads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedResource {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
}

impl ManagedResource {
    pub fn new(id: &NamespacedName) -> Self {
        Self {
            metadata: ObjectMeta::new(id),
            spec: Value::Null,
            status: None,
        }
    }

    pub fn with_spec(mut self, spec: Value) -> Self {
        self.spec = spec;
        self
    }

    pub fn with_finalizers<I, F>(mut self, finalizers: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: AsRef<str>,
    {
        for f in finalizers {
            self.metadata.add_finalizer(f.as_ref());
        }
        self
    }
}

impl Object for ManagedResource {
    #[inline]
    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }
    #[inline]
    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}
