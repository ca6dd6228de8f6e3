//! Alertmanager StatefulSet and governing Service compilation
//!
//! Every replica runs the Alertmanager binary next to a reload sidecar that
//! watches the mounted configuration. Replicas find each other through the
//! headless `alertmanager` Service: each one is passed a `-mesh.peer` flag for
//! every ordinal, so the gossip mesh forms without any external discovery.

use std::collections::BTreeMap;

use tracing::debug;

use sextant_common::crd::{Alertmanager, LabelSelector, StorageSpec};
use sextant_common::kube_utils::{name_of, namespace_of, ObjectMeta};

use crate::k8s::{
    Container, ContainerPort, DeployedStatefulSet, PersistentVolumeClaim, PersistentVolumeClaimSpec,
    PodMeta, PodSpec, PodTemplateSpec, ResourceRequirements, Service, ServicePort, ServiceSpec,
    StatefulSet, StatefulSetSpec, Volume, VolumeMount,
};

/// Image repository used when the Alertmanager sets none
pub const DEFAULT_BASE_IMAGE: &str = "quay.io/prometheus/alertmanager";

/// Version tag used when the Alertmanager sets none
pub const DEFAULT_VERSION: &str = "v0.5.1";

/// Image of the config reload sidecar
pub const DEFAULT_CONFIG_RELOADER_IMAGE: &str = "jimmidyson/configmap-reload";

/// Name of the governing headless Service
pub const GOVERNING_SERVICE_NAME: &str = "alertmanager";

/// HTTP API and UI port
pub const WEB_PORT: u16 = 9093;

/// Gossip mesh port
pub const MESH_PORT: u16 = 6783;

/// Annotation selecting the storage class of a claim
pub const STORAGE_CLASS_ANNOTATION: &str = "volume.beta.kubernetes.io/storage-class";

const CONFIG_VOLUME: &str = "config-volume";
const CONFIG_DIR: &str = "/etc/alertmanager/config";
const CONFIG_FILE: &str = "/etc/alertmanager/config/alertmanager.yaml";
const STORAGE_PATH: &str = "/etc/alertmanager/data";
const DATA_DIR: &str = "/var/alertmanager/data";
const DATA_SUB_PATH: &str = "alertmanager-db";
const RELOADER_NAME: &str = "config-reloader";

// =============================================================================
// Configuration
// =============================================================================

/// Images used when the Alertmanager object leaves them unset
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlertmanagerDefaults {
    /// Alertmanager image repository without tag
    pub base_image: String,
    /// Alertmanager version tag
    pub version: String,
    /// Full image reference of the reload sidecar
    pub config_reloader_image: String,
}

impl Default for AlertmanagerDefaults {
    fn default() -> Self {
        Self {
            base_image: DEFAULT_BASE_IMAGE.to_string(),
            version: DEFAULT_VERSION.to_string(),
            config_reloader_image: DEFAULT_CONFIG_RELOADER_IMAGE.to_string(),
        }
    }
}

// =============================================================================
// Output
// =============================================================================

/// Everything an Alertmanager compiles to
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledAlertmanager {
    /// Replicated Alertmanager pods
    pub statefulset: StatefulSet,
    /// Headless Service giving each pod a stable DNS name
    pub service: Service,
}

// =============================================================================
// StatefulSetCompiler
// =============================================================================

/// Compiler from an Alertmanager object to its StatefulSet and Service
#[derive(Clone, Debug, Default)]
pub struct StatefulSetCompiler {
    defaults: AlertmanagerDefaults,
}

impl StatefulSetCompiler {
    /// Create a compiler with the given image defaults
    pub fn new(defaults: AlertmanagerDefaults) -> Self {
        Self { defaults }
    }

    /// Compile both manifests. `previous` is the currently deployed
    /// StatefulSet, if any; only its annotations are carried over.
    pub fn compile(
        &self,
        am: &Alertmanager,
        previous: Option<&DeployedStatefulSet>,
    ) -> CompiledAlertmanager {
        CompiledAlertmanager {
            statefulset: self.compile_statefulset(am, previous),
            service: Self::compile_service(am),
        }
    }

    /// Compile the StatefulSet
    pub fn compile_statefulset(
        &self,
        am: &Alertmanager,
        previous: Option<&DeployedStatefulSet>,
    ) -> StatefulSet {
        let name = name_of(am);
        let namespace = namespace_of(am);
        let replicas = am.spec.replicas.max(1);
        let image = format!("{}:{}", self.base_image(am), self.version(am));
        let db_volume = format!("{}-db", name);

        let labels = pod_labels(&name);
        let mut template = PodTemplateSpec {
            metadata: PodMeta {
                labels: labels.clone(),
            },
            spec: PodSpec {
                termination_grace_period_seconds: Some(0),
                containers: vec![
                    alertmanager_container(&name, &namespace, &image, replicas, &db_volume),
                    self.reloader_container(),
                ],
                volumes: vec![Volume::from_config_map(CONFIG_VOLUME, name.as_str())],
            },
        };

        let mut volume_claim_templates = Vec::new();
        match &am.spec.storage {
            None => template.spec.volumes.push(Volume::from_empty_dir(db_volume)),
            Some(storage) => volume_claim_templates.push(claim_template(db_volume, storage)),
        }

        let mut metadata = ObjectMeta::new(name.as_str(), namespace.as_str());
        if let Some(prev) = previous {
            metadata.annotations = prev.metadata.annotations.clone();
        }

        debug!(
            alertmanager = %name,
            namespace = %namespace,
            replicas,
            image = %image,
            persistent = am.spec.storage.is_some(),
            carried_annotations = metadata.annotations.len(),
            "compiled alertmanager statefulset"
        );

        StatefulSet {
            api_version: "apps/v1".to_string(),
            kind: "StatefulSet".to_string(),
            metadata,
            spec: StatefulSetSpec {
                service_name: GOVERNING_SERVICE_NAME.to_string(),
                replicas,
                selector: LabelSelector {
                    match_labels: labels,
                    ..Default::default()
                },
                template,
                volume_claim_templates,
            },
        }
    }

    /// Compile the headless governing Service
    pub fn compile_service(am: &Alertmanager) -> Service {
        Service {
            api_version: "v1".to_string(),
            kind: "Service".to_string(),
            metadata: ObjectMeta::new(GOVERNING_SERVICE_NAME, namespace_of(am)),
            spec: ServiceSpec {
                cluster_ip: Some("None".to_string()),
                ports: vec![
                    ServicePort::tcp("web", WEB_PORT),
                    ServicePort::tcp("mesh", MESH_PORT),
                ],
                selector: BTreeMap::from([("app".to_string(), "alertmanager".to_string())]),
            },
        }
    }

    fn base_image<'a>(&'a self, am: &'a Alertmanager) -> &'a str {
        non_empty_or(&am.spec.base_image, &self.defaults.base_image)
    }

    fn version<'a>(&'a self, am: &'a Alertmanager) -> &'a str {
        non_empty_or(&am.spec.version, &self.defaults.version)
    }

    fn reloader_container(&self) -> Container {
        Container {
            name: RELOADER_NAME.to_string(),
            image: self.defaults.config_reloader_image.clone(),
            command: vec![],
            args: vec![
                format!("-webhook-url=http://localhost:{}/-/reload", WEB_PORT),
                format!("-volume-dir={}", CONFIG_DIR),
            ],
            ports: vec![],
            resources: Some(ResourceRequirements {
                limits: BTreeMap::from([
                    ("cpu".to_string(), "5m".to_string()),
                    ("memory".to_string(), "10Mi".to_string()),
                ]),
                ..Default::default()
            }),
            volume_mounts: vec![VolumeMount::new(CONFIG_VOLUME, CONFIG_DIR).read_only()],
        }
    }
}

fn non_empty_or<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.is_empty() {
        default
    } else {
        value
    }
}

fn pod_labels(name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("alertmanager".to_string(), name.to_string()),
        ("app".to_string(), "alertmanager".to_string()),
    ])
}

/// DNS names of every replica under the governing service
fn mesh_peers(name: &str, namespace: &str, replicas: i32) -> Vec<String> {
    (0..replicas)
        .map(|i| {
            format!(
                "-mesh.peer={}-{}.{}.{}.svc",
                name, i, GOVERNING_SERVICE_NAME, namespace
            )
        })
        .collect()
}

fn alertmanager_container(
    name: &str,
    namespace: &str,
    image: &str,
    replicas: i32,
    db_volume: &str,
) -> Container {
    let mut command = vec![
        "/bin/alertmanager".to_string(),
        format!("-config.file={}", CONFIG_FILE),
        format!("-web.listen-address=:{}", WEB_PORT),
        format!("-mesh.listen-address=:{}", MESH_PORT),
        format!("-storage.path={}", STORAGE_PATH),
    ];
    command.extend(mesh_peers(name, namespace, replicas));

    Container {
        name: name.to_string(),
        image: image.to_string(),
        command,
        args: vec![],
        ports: vec![
            ContainerPort::tcp("web", WEB_PORT),
            ContainerPort::tcp("mesh", MESH_PORT),
        ],
        resources: None,
        volume_mounts: vec![
            VolumeMount::new(CONFIG_VOLUME, CONFIG_DIR),
            VolumeMount::new(db_volume, DATA_DIR).with_sub_path(DATA_SUB_PATH),
        ],
    }
}

fn claim_template(name: String, storage: &StorageSpec) -> PersistentVolumeClaim {
    let mut metadata = ObjectMeta::named(name);
    if !storage.class.is_empty() {
        metadata = metadata.with_annotation(STORAGE_CLASS_ANNOTATION, storage.class.as_str());
    }

    PersistentVolumeClaim {
        metadata,
        spec: PersistentVolumeClaimSpec {
            access_modes: vec!["ReadWriteOnce".to_string()],
            resources: ResourceRequirements::from(&storage.resources),
            selector: storage.selector.clone(),
        },
    }
}
