//! Alertmanager Custom Resource Definition
//!
//! Describes a replicated Alertmanager cluster: image, replica count, and
//! optional persistent storage for its silences and notification log.

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::selector::LabelSelector;

/// Resource requests and limits for a volume claim, as quantity strings
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StorageResources {
    /// Requested quantities, e.g. `storage: 10Gi`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub requests: BTreeMap<String, String>,

    /// Quantity limits
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub limits: BTreeMap<String, String>,
}

/// Persistent storage for each Alertmanager replica
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StorageSpec {
    /// Storage class name; no class annotation when empty
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub class: String,

    /// Selects pre-provisioned volumes to bind
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<LabelSelector>,

    /// Size of each claim
    #[serde(default)]
    pub resources: StorageResources,
}

/// Specification for an Alertmanager
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "monitoring.coreos.com",
    version = "v1alpha1",
    kind = "Alertmanager",
    plural = "alertmanagers",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct AlertmanagerSpec {
    /// Alertmanager version tag
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,

    /// Image repository without tag
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub base_image: String,

    /// Number of replicas; values below 1 run one
    #[serde(default)]
    pub replicas: i32,

    /// Persistent storage; an emptyDir is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageSpec>,
}
