//! Custom Resource Definitions consumed by the sextant compilers
//!
//! These are the source objects: they are read, never mutated, and compiled
//! into scrape configuration and Alertmanager manifests.

mod alertmanager;
mod prometheus;
mod selector;
mod service_monitor;
mod types;

pub use alertmanager::{
    Alertmanager, AlertmanagerSpec, StorageResources, StorageSpec,
};
pub use prometheus::{
    AlertingSpec, AlertmanagerEndpoints, Prometheus, PrometheusSpec, DEFAULT_ALERTMANAGER_SCHEME,
};
pub use selector::{
    LabelSelector, LabelSelectorOperator, LabelSelectorRequirement, NamespaceScope,
    NamespaceSelector,
};
pub use service_monitor::{Endpoint, ServiceMonitor, ServiceMonitorSpec};
pub use types::{IntOrString, PortRef};
