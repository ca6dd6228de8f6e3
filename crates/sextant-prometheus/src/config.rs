//! Prometheus configuration compiler
//!
//! Turns a Prometheus object and the ServiceMonitors selected for it into the
//! `prometheus.yaml` document: fixed global settings, the rule-file glob, one
//! scrape job per monitor endpoint and one Alertmanager discovery block per
//! configured Alertmanager.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use sextant_common::crd::{AlertmanagerEndpoints, Endpoint, PortRef, Prometheus, ServiceMonitor};
use sextant_common::kube_utils::{name_of, namespace_of, ObjectMeta};
use sextant_common::{Error, Result};

use crate::relabel::{
    RelabelConfig, RelabelRuleBuilder, META_CONTAINER_PORT_NUMBER, META_ENDPOINT_PORT_NAME,
    META_NAMESPACE, META_SERVICE_NAME,
};

/// Global evaluation and scrape interval
pub const DEFAULT_INTERVAL: &str = "30s";

/// Glob of the rule files mounted into Prometheus
pub const RULE_FILES_GLOB: &str = "/etc/prometheus/rules/*.rules";

/// Key of the configuration document inside its ConfigMap
pub const CONFIG_FILE_NAME: &str = "prometheus.yaml";

// =============================================================================
// Document model
// =============================================================================
//
// Struct fields are declared alphabetically so the rendered YAML keeps the
// key order Prometheus users are used to diffing against.

/// The complete `prometheus.yaml` document
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PrometheusConfig {
    /// Alertmanager discovery
    pub alerting: AlertingConfig,
    /// Global settings
    pub global: GlobalConfig,
    /// Rule file globs
    pub rule_files: Vec<String>,
    /// One job per ServiceMonitor endpoint
    pub scrape_configs: Vec<ScrapeConfig>,
}

/// `global` section
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GlobalConfig {
    /// Rule evaluation interval
    pub evaluation_interval: String,
    /// Default scrape interval
    pub scrape_interval: String,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            evaluation_interval: DEFAULT_INTERVAL.to_string(),
            scrape_interval: DEFAULT_INTERVAL.to_string(),
        }
    }
}

/// Kubernetes service discovery role
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryRole {
    /// Discover targets from Endpoints objects
    Endpoints,
}

/// One `kubernetes_sd_configs` entry
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct KubernetesSdConfig {
    /// What kind of object to enumerate
    pub role: DiscoveryRole,
}

impl KubernetesSdConfig {
    fn endpoints() -> Vec<Self> {
        vec![Self {
            role: DiscoveryRole::Endpoints,
        }]
    }
}

/// One scrape job
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ScrapeConfig {
    /// `<namespace>/<monitor>/<endpoint index>`
    pub job_name: String,
    /// Service discovery
    pub kubernetes_sd_configs: Vec<KubernetesSdConfig>,
    /// Scrape path override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics_path: Option<String>,
    /// Ordered relabel rules
    pub relabel_configs: Vec<RelabelConfig>,
    /// Scheme override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    /// Interval override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scrape_interval: Option<String>,
}

/// `alerting` section
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct AlertingConfig {
    /// One discovery block per Alertmanager
    pub alertmanagers: Vec<AlertmanagerConfig>,
}

/// Discovery block locating one Alertmanager service
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AlertmanagerConfig {
    /// Service discovery
    pub kubernetes_sd_configs: Vec<KubernetesSdConfig>,
    /// Ordered relabel rules
    pub relabel_configs: Vec<RelabelConfig>,
    /// URL scheme
    pub scheme: String,
}

/// Kubernetes ConfigMap carrying the rendered document
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMap {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// String data
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

impl ConfigMap {
    fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            api_version: "v1".to_string(),
            kind: "ConfigMap".to_string(),
            metadata: ObjectMeta::new(name, namespace),
            data: BTreeMap::new(),
        }
    }

    fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

// =============================================================================
// ScrapeConfigCompiler
// =============================================================================

/// Compiler from Prometheus + ServiceMonitors to [`PrometheusConfig`].
///
/// Pure: the same inputs always produce the same document. Jobs follow the
/// order of `monitors`, then endpoint order within each monitor.
pub struct ScrapeConfigCompiler;

impl ScrapeConfigCompiler {
    /// Compile the full configuration document
    pub fn compile(prometheus: &Prometheus, monitors: &[ServiceMonitor]) -> PrometheusConfig {
        let scrape_configs: Vec<ScrapeConfig> = monitors
            .iter()
            .flat_map(|mon| {
                mon.spec
                    .endpoints
                    .iter()
                    .enumerate()
                    .map(move |(i, ep)| Self::compile_scrape_config(mon, ep, i))
            })
            .collect();

        let alertmanagers: Vec<AlertmanagerConfig> = prometheus
            .spec
            .alerting
            .alertmanagers
            .iter()
            .map(Self::compile_alertmanager)
            .collect();

        debug!(
            prometheus = %name_of(prometheus),
            namespace = %namespace_of(prometheus),
            monitors = monitors.len(),
            jobs = scrape_configs.len(),
            alertmanagers = alertmanagers.len(),
            "compiled prometheus config"
        );

        PrometheusConfig {
            alerting: AlertingConfig { alertmanagers },
            global: GlobalConfig::default(),
            rule_files: vec![RULE_FILES_GLOB.to_string()],
            scrape_configs,
        }
    }

    /// Scrape job for `endpoint`, the `index`-th endpoint of `monitor`
    fn compile_scrape_config(
        monitor: &ServiceMonitor,
        endpoint: &Endpoint,
        index: usize,
    ) -> ScrapeConfig {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());

        ScrapeConfig {
            job_name: format!(
                "{}/{}/{}",
                namespace_of(monitor),
                name_of(monitor),
                index
            ),
            kubernetes_sd_configs: KubernetesSdConfig::endpoints(),
            metrics_path: non_empty(&endpoint.path),
            relabel_configs: RelabelRuleBuilder::build(monitor, endpoint, index),
            scheme: non_empty(&endpoint.scheme),
            scrape_interval: non_empty(&endpoint.interval),
        }
    }

    /// Compile the discovery block for one Alertmanager
    pub fn compile_alertmanager(am: &AlertmanagerEndpoints) -> AlertmanagerConfig {
        let mut relabel_configs = vec![
            RelabelConfig::keep(META_SERVICE_NAME, am.name.as_str()),
            RelabelConfig::keep(META_NAMESPACE, am.namespace.as_str()),
        ];

        match am.port_ref() {
            PortRef::TargetName(name) | PortRef::Named(name) => {
                relabel_configs.push(RelabelConfig::keep(META_ENDPOINT_PORT_NAME, name))
            }
            PortRef::TargetNumber(number) => relabel_configs.push(RelabelConfig::keep(
                META_CONTAINER_PORT_NUMBER,
                number.to_string(),
            )),
            PortRef::Unset => {}
        }

        AlertmanagerConfig {
            kubernetes_sd_configs: KubernetesSdConfig::endpoints(),
            relabel_configs,
            scheme: am.scheme_or_default().to_string(),
        }
    }

    /// Compile and wrap the rendered document in the ConfigMap Prometheus mounts
    pub fn compile_config_map(
        prometheus: &Prometheus,
        monitors: &[ServiceMonitor],
    ) -> Result<ConfigMap> {
        let yaml = render_config(&Self::compile(prometheus, monitors))?;
        Ok(ConfigMap::new(
            format!("prometheus-{}", name_of(prometheus)),
            namespace_of(prometheus),
        )
        .with_data(CONFIG_FILE_NAME, yaml))
    }
}

/// Render the document as YAML
pub fn render_config(config: &PrometheusConfig) -> Result<String> {
    serde_yaml::to_string(config)
        .map_err(|e| Error::serialization("PrometheusConfig", e.to_string()))
}

#[cfg(test)]
mod tests {
    use sextant_common::crd::{
        AlertingSpec, Endpoint, IntOrString, PrometheusSpec, ServiceMonitorSpec,
    };

    use super::*;
    use crate::relabel::{RelabelAction, META_CONTAINER_PORT_NAME};

    fn prometheus(alertmanagers: Vec<AlertmanagerEndpoints>) -> Prometheus {
        let mut prom = Prometheus::new(
            "main",
            PrometheusSpec {
                alerting: AlertingSpec { alertmanagers },
                ..Default::default()
            },
        );
        prom.metadata.namespace = Some("monitoring".to_string());
        prom
    }

    fn monitor(namespace: &str, name: &str, endpoints: Vec<Endpoint>) -> ServiceMonitor {
        let mut mon = ServiceMonitor::new(
            name,
            ServiceMonitorSpec {
                endpoints,
                ..Default::default()
            },
        );
        mon.metadata.namespace = Some(namespace.to_string());
        mon
    }

    fn named(port: &str) -> Endpoint {
        Endpoint {
            port: port.to_string(),
            ..Default::default()
        }
    }

    // =========================================================================
    // Document shape
    // =========================================================================

    #[test]
    fn globals_are_fixed() {
        let config = ScrapeConfigCompiler::compile(&prometheus(vec![]), &[]);
        assert_eq!(config.global.evaluation_interval, "30s");
        assert_eq!(config.global.scrape_interval, "30s");
        assert_eq!(config.rule_files, vec![RULE_FILES_GLOB.to_string()]);
        assert!(config.scrape_configs.is_empty());
        assert!(config.alerting.alertmanagers.is_empty());
    }

    #[test]
    fn one_job_per_endpoint_in_order() {
        let monitors = vec![
            monitor("prod", "api", vec![named("web"), named("admin")]),
            monitor("staging", "db", vec![named("metrics")]),
        ];
        let config = ScrapeConfigCompiler::compile(&prometheus(vec![]), &monitors);
        let names: Vec<_> = config.scrape_configs.iter().map(|j| j.job_name.as_str()).collect();
        assert_eq!(names, vec!["prod/api/0", "prod/api/1", "staging/db/0"]);
        assert!(config
            .scrape_configs
            .iter()
            .all(|j| j.kubernetes_sd_configs[0].role == DiscoveryRole::Endpoints));
    }

    #[test]
    fn monitor_without_endpoints_adds_no_jobs() {
        let monitors = vec![monitor("prod", "empty", vec![])];
        let config = ScrapeConfigCompiler::compile(&prometheus(vec![]), &monitors);
        assert!(config.scrape_configs.is_empty());
    }

    // =========================================================================
    // Endpoint overrides
    // =========================================================================

    #[test]
    fn overrides_copied_only_when_set() {
        let ep = Endpoint {
            port: "web".to_string(),
            path: "/stats".to_string(),
            scheme: "https".to_string(),
            interval: "10s".to_string(),
            ..Default::default()
        };
        let mon = monitor("prod", "api", vec![ep, named("web")]);
        let jobs = ScrapeConfigCompiler::compile(&prometheus(vec![]), &[mon]).scrape_configs;

        let job = &jobs[0];
        assert_eq!(job.metrics_path.as_deref(), Some("/stats"));
        assert_eq!(job.scheme.as_deref(), Some("https"));
        assert_eq!(job.scrape_interval.as_deref(), Some("10s"));

        let job = &jobs[1];
        assert!(job.metrics_path.is_none());
        assert!(job.scheme.is_none());
        assert!(job.scrape_interval.is_none());
    }

    #[test]
    fn job_carries_relabel_rules_of_its_endpoint() {
        let mon = monitor("prod", "api", vec![named("web")]);
        let job = ScrapeConfigCompiler::compile_scrape_config(&mon, &named("web"), 0);
        assert_eq!(job.relabel_configs, RelabelRuleBuilder::build(&mon, &named("web"), 0));
    }

    // =========================================================================
    // Alertmanager discovery
    // =========================================================================

    #[test]
    fn alertmanager_with_named_port() {
        let am = AlertmanagerEndpoints {
            namespace: "monitoring".to_string(),
            name: "alertmanager-main".to_string(),
            port: IntOrString::String("web".to_string()),
            scheme: String::new(),
        };
        let block = ScrapeConfigCompiler::compile_alertmanager(&am);
        assert_eq!(block.scheme, "http");
        assert_eq!(
            block.relabel_configs,
            vec![
                RelabelConfig::keep(META_SERVICE_NAME, "alertmanager-main"),
                RelabelConfig::keep(META_NAMESPACE, "monitoring"),
                RelabelConfig::keep(META_ENDPOINT_PORT_NAME, "web"),
            ]
        );
    }

    #[test]
    fn alertmanager_with_numeric_port() {
        let am = AlertmanagerEndpoints {
            namespace: "monitoring".to_string(),
            name: "am".to_string(),
            port: IntOrString::Int(9093),
            scheme: "https".to_string(),
        };
        let block = ScrapeConfigCompiler::compile_alertmanager(&am);
        assert_eq!(block.scheme, "https");
        assert_eq!(
            block.relabel_configs[2],
            RelabelConfig::keep(META_CONTAINER_PORT_NUMBER, "9093")
        );
        assert!(!block
            .relabel_configs
            .iter()
            .any(|r| r.source_labels == [META_CONTAINER_PORT_NAME]));
    }

    #[test]
    fn alertmanager_without_port_has_two_rules() {
        let am = AlertmanagerEndpoints {
            namespace: "monitoring".to_string(),
            name: "am".to_string(),
            ..Default::default()
        };
        let block = ScrapeConfigCompiler::compile_alertmanager(&am);
        assert_eq!(block.relabel_configs.len(), 2);
        assert!(block
            .relabel_configs
            .iter()
            .all(|r| r.action == Some(RelabelAction::Keep)));
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    #[test]
    fn rendered_yaml_has_expected_keys() {
        let monitors = vec![monitor("prod", "api", vec![named("web")])];
        let yaml = render_config(&ScrapeConfigCompiler::compile(&prometheus(vec![]), &monitors))
            .unwrap();
        assert!(yaml.contains("evaluation_interval: 30s"));
        assert!(yaml.contains("job_name: prod/api/0"));
        assert!(yaml.contains("- role: endpoints"));
        assert!(yaml.contains("${1}-web"));
        // Overrides that were never set are absent, not empty
        assert!(!yaml.contains("metrics_path"));
        assert!(!yaml.contains("scrape_interval: ''"));
        // The pod-template-hash blanking keeps its empty replacement
        assert!(yaml.contains("replacement: ''"));
    }

    #[test]
    fn config_map_wraps_rendered_document() {
        let monitors = vec![monitor("prod", "api", vec![named("web")])];
        let prom = prometheus(vec![]);
        let cm = ScrapeConfigCompiler::compile_config_map(&prom, &monitors).unwrap();
        assert_eq!(cm.metadata.name, "prometheus-main");
        assert_eq!(cm.metadata.namespace.as_deref(), Some("monitoring"));
        assert_eq!(
            cm.data[CONFIG_FILE_NAME],
            render_config(&ScrapeConfigCompiler::compile(&prom, &monitors)).unwrap()
        );
    }
}
