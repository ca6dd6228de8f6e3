//! Shared Kubernetes helpers for compiled resources

use std::collections::BTreeMap;

use kube::{Resource, ResourceExt};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// =============================================================================
// ObjectMeta - metadata for all compiled resources
// =============================================================================

/// Kubernetes metadata as emitted by the compilers.
///
/// Only the fields the compilers set; empty maps are omitted when serialized.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    /// Resource name
    pub name: String,
    /// Resource namespace (absent for embedded templates)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Annotations
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl ObjectMeta {
    /// Create namespaced metadata
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: Some(namespace.into()),
            ..Default::default()
        }
    }

    /// Create metadata with only a name (claim templates, embedded objects)
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add an annotation
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }
}

// =============================================================================
// Source object identity
// =============================================================================

/// Namespace of a source object, empty when unset.
///
/// Source objects arrive already validated by the caller; a missing namespace
/// is defaulted rather than rejected.
pub fn namespace_of<K: Resource>(obj: &K) -> String {
    obj.namespace().unwrap_or_default()
}

/// Name of a source object, empty when unset.
pub fn name_of<K: Resource>(obj: &K) -> String {
    obj.meta().name.clone().unwrap_or_default()
}

/// Stable `namespace/name` key for a source object.
pub fn object_key<K: Resource>(obj: &K) -> String {
    format!("{}/{}", namespace_of(obj), name_of(obj))
}

/// Reject a source object without a name.
///
/// Every compiled artifact is named after its source object, so an unnamed
/// one would produce jobs and manifests with empty names.
pub fn require_name<K: Resource>(obj: &K) -> Result<()> {
    if name_of(obj).is_empty() {
        return Err(Error::validation(object_key(obj), "metadata.name is required"));
    }
    Ok(())
}
