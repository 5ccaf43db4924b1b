use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Unique key of a stored object: namespace plus name.
///
/// An empty namespace denotes a cluster-scoped object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespacedName {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    pub name: String,
}

impl NamespacedName {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Key of a cluster-scoped object.
    pub fn cluster(name: impl Into<String>) -> Self {
        Self::new(String::new(), name)
    }

    #[inline]
    pub fn is_cluster_scoped(&self) -> bool {
        self.namespace.is_empty()
    }
}

impl fmt::Display for NamespacedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}/{}", self.namespace, self.name)
        }
    }
}

impl FromStr for NamespacedName {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ModelError::InvalidName(s.to_string());

        let (namespace, name) = match s.trim().split_once('/') {
            Some((ns, name)) if !ns.is_empty() => (ns, name),
            Some(_) => return Err(invalid()),
            None => ("", s.trim()),
        };
        if name.is_empty() || name.contains('/') {
            return Err(invalid());
        }
        Ok(Self::new(namespace, name))
    }
}

impl From<(&str, &str)> for NamespacedName {
    fn from((namespace, name): (&str, &str)) -> Self {
        Self::new(namespace, name)
    }
}
