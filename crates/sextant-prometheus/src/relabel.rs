//! Relabeling rules for ServiceMonitor scrape jobs
//!
//! Prometheus applies `relabel_configs` in list order to the metadata labels
//! produced by Kubernetes service discovery. `keep`/`drop` rules discard
//! targets, later rules overwrite labels set by earlier ones. The order built
//! here is therefore part of the output contract and is never re-sorted.

use serde::{Deserialize, Serialize};
use tracing::debug;

use sextant_common::crd::{
    Endpoint, LabelSelectorOperator, NamespaceScope, PortRef, ServiceMonitor,
};
use sextant_common::kube_utils::{name_of, namespace_of};

// =============================================================================
// Service discovery metadata labels
// =============================================================================

/// Prefix of discovered service labels
pub const META_SERVICE_LABEL_PREFIX: &str = "__meta_kubernetes_service_label_";
/// Discovered object namespace
pub const META_NAMESPACE: &str = "__meta_kubernetes_namespace";
/// Discovered service name
pub const META_SERVICE_NAME: &str = "__meta_kubernetes_service_name";
/// Discovered endpoint (service) port name
pub const META_ENDPOINT_PORT_NAME: &str = "__meta_kubernetes_endpoint_port_name";
/// Discovered container port name
pub const META_CONTAINER_PORT_NAME: &str = "__meta_kubernetes_container_port_name";
/// Discovered container port number
pub const META_CONTAINER_PORT_NUMBER: &str = "__meta_kubernetes_container_port_number";
/// Pod template hash label, unique per ReplicaSet and useless as a series label
pub const META_POD_TEMPLATE_HASH: &str = "__meta_kubernetes_pod_label_pod_template_hash";

/// Regex matching any non-empty value
const NON_EMPTY: &str = ".+";

// =============================================================================
// RelabelConfig
// =============================================================================

/// Relabel action
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RelabelAction {
    /// Drop targets whose source value does not match
    Keep,
    /// Drop targets whose source value matches
    Drop,
    /// Write `replacement` into `target_label`
    Replace,
    /// Copy every label whose name matches `regex` to `replacement`
    Labelmap,
}

/// One Prometheus `relabel_config` entry.
///
/// Fields are declared in alphabetical order, which is the key order of the
/// rendered YAML. Unset fields are omitted so Prometheus applies its own
/// defaults; `replacement: ""` is a real value and is rendered.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelabelConfig {
    /// Action, `replace` when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<RelabelAction>,
    /// Regex matched against the joined source values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    /// Replacement written for `replace`/`labelmap`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement: Option<String>,
    /// Source labels, joined in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_labels: Vec<String>,
    /// Label written by `replace`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_label: Option<String>,
}

impl RelabelConfig {
    /// Keep targets whose `source` matches `regex`
    pub fn keep(source: impl Into<String>, regex: impl Into<String>) -> Self {
        Self::filter(RelabelAction::Keep, source, regex)
    }

    /// Drop targets whose `source` matches `regex`
    pub fn drop(source: impl Into<String>, regex: impl Into<String>) -> Self {
        Self::filter(RelabelAction::Drop, source, regex)
    }

    fn filter(action: RelabelAction, source: impl Into<String>, regex: impl Into<String>) -> Self {
        Self {
            action: Some(action),
            regex: Some(regex.into()),
            source_labels: vec![source.into()],
            ..Default::default()
        }
    }

    /// Copy labels matching `regex` to names built from `replacement`
    pub fn labelmap(regex: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            action: Some(RelabelAction::Labelmap),
            regex: Some(regex.into()),
            replacement: Some(replacement.into()),
            ..Default::default()
        }
    }

    /// Default-action rule copying `source` into `target`
    pub fn copy(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source_labels: vec![source.into()],
            target_label: Some(target.into()),
            ..Default::default()
        }
    }
}

/// Replace every character outside `[A-Za-z0-9_]` with `_`.
///
/// Mirrors how service discovery turns Kubernetes label keys into
/// Prometheus label names.
pub fn sanitize_label_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

fn service_label(key: &str) -> String {
    format!("{}{}", META_SERVICE_LABEL_PREFIX, sanitize_label_name(key))
}

// =============================================================================
// RelabelRuleBuilder
// =============================================================================

/// Builds the relabel rules of one ServiceMonitor endpoint.
///
/// Rules are appended in this order:
/// 1. `keep` per exact-match selector label
/// 2. `keep`/`drop` per set-based selector expression
/// 3. namespace filter
/// 4. port filter
/// 5. namespace, `svc_*` and `pod_*` label copies, pod-template-hash removal
/// 6. job name from the service name and port
/// 7. job name from the monitor's job label, overriding 6
pub struct RelabelRuleBuilder;

impl RelabelRuleBuilder {
    /// Build the ordered rules for `endpoint` (at position `index`) of `monitor`
    pub fn build(monitor: &ServiceMonitor, endpoint: &Endpoint, index: usize) -> Vec<RelabelConfig> {
        let spec = &monitor.spec;
        let port = endpoint.port_ref();
        let mut rules = Vec::new();

        for (key, value) in &spec.selector.match_labels {
            rules.push(RelabelConfig::keep(service_label(key), value.as_str()));
        }

        for exp in &spec.selector.match_expressions {
            let source = service_label(&exp.key);
            match exp.operator {
                LabelSelectorOperator::In => {
                    rules.push(RelabelConfig::keep(source, exp.values.join("|")))
                }
                LabelSelectorOperator::NotIn => {
                    rules.push(RelabelConfig::drop(source, exp.values.join("|")))
                }
                LabelSelectorOperator::Exists => rules.push(RelabelConfig::keep(source, NON_EMPTY)),
                LabelSelectorOperator::DoesNotExist => {
                    rules.push(RelabelConfig::drop(source, NON_EMPTY))
                }
                LabelSelectorOperator::Unknown => {
                    debug!(key = %exp.key, "skipping selector expression with unknown operator")
                }
            }
        }

        match spec.namespace_selector.scope() {
            NamespaceScope::Own => {
                rules.push(RelabelConfig::keep(META_NAMESPACE, namespace_of(monitor)))
            }
            NamespaceScope::Names(names) => {
                rules.push(RelabelConfig::keep(META_NAMESPACE, names.join("|")))
            }
            NamespaceScope::Any => {}
        }

        match port {
            PortRef::Named(name) => rules.push(RelabelConfig::keep(META_ENDPOINT_PORT_NAME, name)),
            PortRef::TargetName(name) => {
                rules.push(RelabelConfig::keep(META_CONTAINER_PORT_NAME, name))
            }
            PortRef::TargetNumber(number) => rules.push(RelabelConfig::keep(
                META_CONTAINER_PORT_NUMBER,
                number.to_string(),
            )),
            PortRef::Unset => {}
        }

        rules.push(RelabelConfig::copy(META_NAMESPACE, "namespace"));
        rules.push(RelabelConfig::labelmap(
            "__meta_kubernetes_service_label_(.+)",
            "svc_$1",
        ));
        rules.push(RelabelConfig {
            action: Some(RelabelAction::Replace),
            target_label: Some(META_POD_TEMPLATE_HASH.to_string()),
            replacement: Some(String::new()),
            ..Default::default()
        });
        rules.push(RelabelConfig::labelmap(
            "__meta_kubernetes_pod_label_(.+)",
            "pod_$1",
        ));

        // The service-name rule stays even with a job label: targets whose
        // service lacks that label keep a usable job name.
        if let Some(suffix) = port.job_suffix() {
            let replacement = format!("${{1}}-{}", suffix);
            rules.push(RelabelConfig {
                replacement: Some(replacement.clone()),
                source_labels: vec![META_SERVICE_NAME.to_string()],
                target_label: Some("job".to_string()),
                ..Default::default()
            });
            if !spec.job_label.is_empty() {
                rules.push(RelabelConfig {
                    regex: Some("(.+)".to_string()),
                    replacement: Some(replacement),
                    source_labels: vec![service_label(&spec.job_label)],
                    target_label: Some("job".to_string()),
                    ..Default::default()
                });
            }
        }

        debug!(
            monitor = %name_of(monitor),
            namespace = %namespace_of(monitor),
            endpoint = index,
            rules = rules.len(),
            "built relabel rules"
        );
        rules
    }
}
