//! Kubernetes resource types emitted by the Alertmanager compiler

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use sextant_common::crd::{LabelSelector, StorageResources};
use sextant_common::kube_utils::ObjectMeta;

// =============================================================================
// StatefulSet
// =============================================================================

/// Kubernetes StatefulSet
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatefulSet {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// Spec
    pub spec: StatefulSetSpec,
}

/// A StatefulSet as read back from the cluster.
///
/// Only `metadata` is parsed. The `spec` of a `kubectl get -o yaml` dump carries
/// server defaults and quantity forms (`cpu: 1`) the output structs do not
/// accept, and nothing outside the metadata is reused.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct DeployedStatefulSet {
    /// Metadata
    #[serde(default)]
    pub metadata: ObjectMeta,
}

/// StatefulSet spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatefulSetSpec {
    /// Governing headless service; pods resolve as `<pod>.<service>.<ns>.svc`
    pub service_name: String,
    /// Number of replicas
    pub replicas: i32,
    /// Label selector
    pub selector: LabelSelector,
    /// Pod template
    pub template: PodTemplateSpec,
    /// One claim per replica, created from these templates
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volume_claim_templates: Vec<PersistentVolumeClaim>,
}

/// Pod template spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PodTemplateSpec {
    /// Pod metadata
    pub metadata: PodMeta,
    /// Pod spec
    pub spec: PodSpec,
}

/// Pod metadata (subset of ObjectMeta)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PodMeta {
    /// Labels
    pub labels: BTreeMap<String, String>,
}

/// Pod spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PodSpec {
    /// Seconds between SIGTERM and SIGKILL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub termination_grace_period_seconds: Option<i64>,
    /// Containers
    pub containers: Vec<Container>,
    /// Volumes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Volume>,
}

// =============================================================================
// Container
// =============================================================================

/// Container spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    /// Container name
    pub name: String,
    /// Image
    pub image: String,
    /// Command
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
    /// Args
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// Ports
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<ContainerPort>,
    /// Resource requirements
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,
    /// Volume mounts
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volume_mounts: Vec<VolumeMount>,
}

/// Container port
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContainerPort {
    /// Port name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Port number
    pub container_port: u16,
    /// Protocol
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
}

impl ContainerPort {
    /// Named TCP port
    pub fn tcp(name: impl Into<String>, port: u16) -> Self {
        Self {
            name: Some(name.into()),
            container_port: port,
            protocol: Some("TCP".to_string()),
        }
    }
}

/// Resource requests and limits as quantity strings
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRequirements {
    /// Requests
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub requests: BTreeMap<String, String>,
    /// Limits
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub limits: BTreeMap<String, String>,
}

impl From<&StorageResources> for ResourceRequirements {
    fn from(res: &StorageResources) -> Self {
        Self {
            requests: res.requests.clone(),
            limits: res.limits.clone(),
        }
    }
}

// =============================================================================
// Volumes
// =============================================================================

/// Volume
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    /// Volume name
    pub name: String,
    /// ConfigMap source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_map: Option<ConfigMapVolumeSource>,
    /// EmptyDir source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty_dir: Option<EmptyDirVolumeSource>,
}

impl Volume {
    /// Create a Volume backed by a ConfigMap.
    pub fn from_config_map(name: impl Into<String>, cm_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config_map: Some(ConfigMapVolumeSource {
                name: cm_name.into(),
            }),
            empty_dir: None,
        }
    }

    /// Create a Volume backed by an emptyDir.
    pub fn from_empty_dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config_map: None,
            empty_dir: Some(EmptyDirVolumeSource {}),
        }
    }
}

/// ConfigMap volume source
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ConfigMapVolumeSource {
    /// ConfigMap name
    pub name: String,
}

/// EmptyDir volume source; renders as `emptyDir: {}`
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct EmptyDirVolumeSource {}

/// Volume mount
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VolumeMount {
    /// Volume name
    pub name: String,
    /// Mount path
    pub mount_path: String,
    /// Sub path within the volume
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_path: Option<String>,
    /// Read only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
}

impl VolumeMount {
    /// Read-write mount of a whole volume
    pub fn new(name: impl Into<String>, mount_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mount_path: mount_path.into(),
            sub_path: None,
            read_only: None,
        }
    }

    /// Mount only `sub_path` of the volume
    pub fn with_sub_path(mut self, sub_path: impl Into<String>) -> Self {
        self.sub_path = Some(sub_path.into());
        self
    }

    /// Mount read-only
    pub fn read_only(mut self) -> Self {
        self.read_only = Some(true);
        self
    }
}

/// PersistentVolumeClaim as embedded in `volumeClaimTemplates`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersistentVolumeClaim {
    /// Metadata
    pub metadata: ObjectMeta,
    /// Spec
    pub spec: PersistentVolumeClaimSpec,
}

/// PersistentVolumeClaim spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersistentVolumeClaimSpec {
    /// Access modes
    pub access_modes: Vec<String>,
    /// Requested size
    #[serde(default)]
    pub resources: ResourceRequirements,
    /// Restricts binding to matching volumes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<LabelSelector>,
}

// =============================================================================
// Service
// =============================================================================

/// Kubernetes Service
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// Spec
    pub spec: ServiceSpec,
}

/// Service spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSpec {
    /// `None` makes the service headless
    #[serde(rename = "clusterIP", default, skip_serializing_if = "Option::is_none")]
    pub cluster_ip: Option<String>,
    /// Ports
    pub ports: Vec<ServicePort>,
    /// Selector
    pub selector: BTreeMap<String, String>,
}

/// Service port
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServicePort {
    /// Port name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Port number
    pub port: u16,
    /// Target port
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_port: Option<u16>,
    /// Protocol
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
}

impl ServicePort {
    /// Named TCP port forwarding to the same container port
    pub fn tcp(name: impl Into<String>, port: u16) -> Self {
        Self {
            name: Some(name.into()),
            port,
            target_port: Some(port),
            protocol: Some("TCP".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_service_renders_cluster_ip_key() {
        let spec = ServiceSpec {
            cluster_ip: Some("None".to_string()),
            ports: vec![ServicePort::tcp("web", 9093)],
            selector: BTreeMap::new(),
        };
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["clusterIP"], "None");
        assert_eq!(json["ports"][0]["targetPort"], 9093);
        assert_eq!(json["ports"][0]["protocol"], "TCP");
    }

    #[test]
    fn empty_dir_renders_as_empty_object() {
        let json = serde_json::to_value(Volume::from_empty_dir("am-db")).unwrap();
        assert_eq!(json["emptyDir"], serde_json::json!({}));
        assert!(json.get("configMap").is_none());
    }

    #[test]
    fn volume_mount_builders() {
        let mount = VolumeMount::new("config-volume", "/etc/alertmanager/config").read_only();
        assert_eq!(mount.read_only, Some(true));
        assert!(mount.sub_path.is_none());

        let mount = VolumeMount::new("am-db", "/var/alertmanager/data").with_sub_path("alertmanager-db");
        assert_eq!(mount.sub_path.as_deref(), Some("alertmanager-db"));
        let json = serde_json::to_value(&mount).unwrap();
        assert_eq!(json["mountPath"], "/var/alertmanager/data");
        assert_eq!(json["subPath"], "alertmanager-db");
        assert!(json.get("readOnly").is_none());
    }

    #[test]
    fn deployed_statefulset_reads_only_metadata() {
        let dump = r#"
apiVersion: apps/v1
kind: StatefulSet
metadata:
  name: main
  namespace: monitoring
  uid: 5f0c2c9e
  generation: 4
  labels:
    app: alertmanager
  annotations:
    deployed-by: ops
spec:
  replicas: 2
  podManagementPolicy: OrderedReady
  template:
    spec:
      containers:
        - name: alertmanager
          resources:
            limits:
              cpu: 1
              memory: 512Mi
status:
  readyReplicas: 2
"#;
        let deployed: DeployedStatefulSet = serde_yaml::from_str(dump).unwrap();
        assert_eq!(deployed.metadata.name, "main");
        assert_eq!(deployed.metadata.annotations["deployed-by"], "ops");
        assert_eq!(deployed.metadata.annotations.len(), 1);
    }

    #[test]
    fn deployed_statefulset_without_annotations() {
        let deployed: DeployedStatefulSet =
            serde_yaml::from_str("kind: StatefulSet\nmetadata:\n  name: main\n").unwrap();
        assert!(deployed.metadata.annotations.is_empty());
    }

    #[test]
    fn storage_resources_convert() {
        let res = StorageResources {
            requests: BTreeMap::from([("storage".to_string(), "10Gi".to_string())]),
            limits: BTreeMap::new(),
        };
        let req = ResourceRequirements::from(&res);
        assert_eq!(req.requests["storage"], "10Gi");
        assert!(req.limits.is_empty());
    }
}
