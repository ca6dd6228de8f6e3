//! ServiceMonitor Custom Resource Definition
//!
//! A ServiceMonitor declares which Kubernetes services to scrape: a label
//! selector over services, the namespaces to look in, and one scrape
//! endpoint per port. Each endpoint becomes one scrape job.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::selector::{LabelSelector, NamespaceSelector};
use super::types::{IntOrString, PortRef};

/// A single scrape endpoint of a ServiceMonitor
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// Name of the service port to scrape
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub port: String,

    /// Container port to scrape, by name or number
    #[serde(default, skip_serializing_if = "IntOrString::is_unset")]
    pub target_port: IntOrString,

    /// HTTP path to scrape (engine default when empty)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,

    /// URL scheme (engine default when empty)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub scheme: String,

    /// Scrape interval, e.g. `15s` (engine default when empty)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub interval: String,
}

impl Endpoint {
    /// The port this endpoint filters on
    pub fn port_ref(&self) -> PortRef<'_> {
        PortRef::resolve(&self.port, &self.target_port)
    }
}

/// Specification for a ServiceMonitor
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "monitoring.coreos.com",
    version = "v1alpha1",
    kind = "ServiceMonitor",
    plural = "servicemonitors",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct ServiceMonitorSpec {
    /// Service label whose value names the job instead of the service name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub job_label: String,

    /// Endpoints to scrape on every selected service
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,

    /// Selects the services to scrape
    #[serde(default)]
    pub selector: LabelSelector,

    /// Namespaces to discover services in
    #[serde(default)]
    pub namespace_selector: NamespaceSelector,
}
