//! Prometheus scrape configuration compiler for sextant
//!
//! This crate compiles a Prometheus object and the ServiceMonitors it selects
//! into the `prometheus.yaml` document Prometheus loads:
//!
//! - **Relabel**: Builds the ordered relabel rules for one monitor endpoint
//! - **Config**: Assembles scrape jobs and Alertmanager discovery into one document

#![deny(missing_docs)]

pub mod config;
pub mod relabel;

pub use config::{
    render_config, AlertingConfig, AlertmanagerConfig, ConfigMap, DiscoveryRole, GlobalConfig,
    KubernetesSdConfig, PrometheusConfig, ScrapeConfig, ScrapeConfigCompiler,
};
pub use relabel::{sanitize_label_name, RelabelAction, RelabelConfig, RelabelRuleBuilder};
