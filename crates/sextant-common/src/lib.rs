//! Common types for sextant: source CRDs, compiled-resource metadata, and errors

#![deny(missing_docs)]

pub mod crd;
pub mod error;
pub mod kube_utils;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// API group shared by ServiceMonitor, Prometheus and Alertmanager
pub const MONITORING_GROUP: &str = "monitoring.coreos.com";

/// API version served for the monitoring CRDs
pub const MONITORING_VERSION: &str = "v1alpha1";
