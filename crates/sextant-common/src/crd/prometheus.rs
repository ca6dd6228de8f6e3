//! Prometheus Custom Resource Definition
//!
//! Only the parts the configuration compiler reads are modelled: which
//! ServiceMonitors feed this Prometheus and where its Alertmanagers live.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::selector::LabelSelector;
use super::service_monitor::ServiceMonitor;
use super::types::{IntOrString, PortRef};

/// Scheme used to reach an Alertmanager when none is given
pub const DEFAULT_ALERTMANAGER_SCHEME: &str = "http";

/// Location of one Alertmanager service
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AlertmanagerEndpoints {
    /// Namespace of the Alertmanager service
    pub namespace: String,

    /// Name of the Alertmanager service
    pub name: String,

    /// Service port, by name or number
    #[serde(default, skip_serializing_if = "IntOrString::is_unset")]
    pub port: IntOrString,

    /// URL scheme, `http` when empty
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub scheme: String,
}

impl AlertmanagerEndpoints {
    /// Scheme with the `http` default applied
    pub fn scheme_or_default(&self) -> &str {
        if self.scheme.is_empty() {
            DEFAULT_ALERTMANAGER_SCHEME
        } else {
            &self.scheme
        }
    }

    /// The port this target filters on. Never `PortRef::Named`.
    pub fn port_ref(&self) -> PortRef<'_> {
        PortRef::from_target(&self.port)
    }
}

/// Alerting section of a Prometheus spec
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AlertingSpec {
    /// Alertmanagers to send alerts to
    #[serde(default)]
    pub alertmanagers: Vec<AlertmanagerEndpoints>,
}

/// Specification for a Prometheus
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "monitoring.coreos.com",
    version = "v1alpha1",
    kind = "Prometheus",
    plural = "prometheuses",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct PrometheusSpec {
    /// ServiceMonitors to include, by their labels. Absent selects all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_monitor_selector: Option<LabelSelector>,

    /// Alerting configuration
    #[serde(default)]
    pub alerting: AlertingSpec,
}

impl Prometheus {
    /// Whether `monitor` feeds this Prometheus
    pub fn selects(&self, monitor: &ServiceMonitor) -> bool {
        match &self.spec.service_monitor_selector {
            Some(selector) => {
                let labels = monitor.metadata.labels.clone().unwrap_or_default();
                selector.matches(&labels)
            }
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::crd::ServiceMonitorSpec;

    fn monitor_with_labels(labels: &[(&str, &str)]) -> ServiceMonitor {
        let mut mon = ServiceMonitor::new("m", ServiceMonitorSpec::default());
        mon.metadata.labels = Some(
            labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        mon
    }

    #[test]
    fn scheme_defaults_to_http() {
        let am = AlertmanagerEndpoints::default();
        assert_eq!(am.scheme_or_default(), "http");

        let am = AlertmanagerEndpoints {
            scheme: "https".to_string(),
            ..Default::default()
        };
        assert_eq!(am.scheme_or_default(), "https");
    }

    #[test]
    fn alertmanager_port_never_named() {
        let am = AlertmanagerEndpoints {
            port: IntOrString::String("web".to_string()),
            ..Default::default()
        };
        assert_eq!(am.port_ref(), PortRef::TargetName("web"));
    }

    #[test]
    fn absent_selector_selects_everything() {
        let prom = Prometheus::new("main", PrometheusSpec::default());
        assert!(prom.selects(&monitor_with_labels(&[])));
        assert!(prom.selects(&monitor_with_labels(&[("team", "x")])));
    }

    #[test]
    fn selector_filters_monitors() {
        let prom = Prometheus::new(
            "main",
            PrometheusSpec {
                service_monitor_selector: Some(LabelSelector {
                    match_labels: BTreeMap::from([("team".to_string(), "x".to_string())]),
                    ..Default::default()
                }),
                ..Default::default()
            },
        );
        assert!(prom.selects(&monitor_with_labels(&[("team", "x")])));
        assert!(!prom.selects(&monitor_with_labels(&[("team", "y")])));
        assert!(!prom.selects(&monitor_with_labels(&[])));
    }
}
