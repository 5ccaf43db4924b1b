use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use crate::{NamespacedName, ResourceVersion};

/// Metadata every stored object carries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    /// Object name, unique within its namespace.
    pub name: String,
    /// Owning namespace; empty for cluster-scoped objects.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    /// Store-assigned unique id.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uid: String,
    /// Optimistic-concurrency token, bumped by the store on every write.
    #[serde(default)]
    pub resource_version: ResourceVersion,
    #[serde(default)]
    pub generation: u64,
    /// Lifecycle markers guarding deletion.
    ///
    /// Treated as a set; use the helpers below rather than pushing directly.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub finalizers: Vec<String>,
    /// Set by the store once deletion was requested.
    #[serde(
        default,
        with = "time_serde",
        skip_serializing_if = "Option::is_none"
    )]
    pub deletion_timestamp: Option<SystemTime>,
}

impl ObjectMeta {
    pub fn new(id: &NamespacedName) -> Self {
        Self {
            name: id.name.clone(),
            namespace: id.namespace.clone(),
            ..Default::default()
        }
    }

    pub fn id(&self) -> NamespacedName {
        NamespacedName::new(self.namespace.clone(), self.name.clone())
    }

    /// Returns `true` once the store has marked the object for removal.
    #[inline]
    pub fn is_deleting(&self) -> bool {
        self.deletion_timestamp.is_some()
    }

    pub fn has_finalizer(&self, finalizer: &str) -> bool {
        self.finalizers.iter().any(|f| f == finalizer)
    }

    /// Insert `finalizer` unless already present. Returns whether the set changed.
    pub fn add_finalizer(&mut self, finalizer: &str) -> bool {
        if self.has_finalizer(finalizer) {
            return false;
        }
        self.finalizers.push(finalizer.to_string());
        true
    }

    /// Drop every occurrence of `finalizer`. Returns whether the set changed.
    pub fn remove_finalizer(&mut self, finalizer: &str) -> bool {
        let before = self.finalizers.len();
        self.finalizers.retain(|f| f != finalizer);
        self.finalizers.len() != before
    }
}

/// `Option<SystemTime>` as an RFC3339 string with full sub-second precision.
mod time_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::SystemTime;
    use time::{OffsetDateTime, format_description::well_known::Rfc3339};

    pub fn serialize<S>(ts: &Option<SystemTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let text = match ts {
            Some(t) => Some(
                OffsetDateTime::from(*t)
                    .format(&Rfc3339)
                    .map_err(serde::ser::Error::custom)?,
            ),
            None => None,
        };
        text.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<SystemTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = Option::<String>::deserialize(deserializer)?;
        text.map(|s| {
            OffsetDateTime::parse(&s, &Rfc3339)
                .map(SystemTime::from)
                .map_err(serde::de::Error::custom)
        })
        .transpose()
    }
}
