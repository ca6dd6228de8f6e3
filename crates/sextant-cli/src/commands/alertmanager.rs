//! Alertmanager command

use std::path::PathBuf;

use clap::Args;
use kube::Resource;
use tracing::info;

use sextant_alertmanager::k8s::DeployedStatefulSet;
use sextant_alertmanager::{
    AlertmanagerDefaults, StatefulSetCompiler, DEFAULT_BASE_IMAGE, DEFAULT_CONFIG_RELOADER_IMAGE,
    DEFAULT_VERSION,
};
use sextant_common::crd::Alertmanager;
use sextant_common::kube_utils::{name_of, require_name};

use super::{load_one, to_document, write_stream};
use crate::Result;

#[derive(Args, Debug)]
pub struct AlertmanagerArgs {
    /// File containing the Alertmanager object
    #[arg(long)]
    pub alertmanager: PathBuf,

    /// File containing the currently deployed StatefulSet; its annotations are kept
    #[arg(long)]
    pub previous: Option<PathBuf>,

    /// Alertmanager image repository used when the object sets none
    #[arg(long, env = "SEXTANT_ALERTMANAGER_IMAGE", default_value = DEFAULT_BASE_IMAGE)]
    pub base_image: String,

    /// Alertmanager version used when the object sets none
    #[arg(long = "version", env = "SEXTANT_ALERTMANAGER_VERSION", default_value = DEFAULT_VERSION)]
    pub alertmanager_version: String,

    /// Config reload sidecar image
    #[arg(long, env = "SEXTANT_CONFIG_RELOADER_IMAGE", default_value = DEFAULT_CONFIG_RELOADER_IMAGE)]
    pub reloader_image: String,
}

impl AlertmanagerArgs {
    fn defaults(&self) -> AlertmanagerDefaults {
        AlertmanagerDefaults {
            base_image: self.base_image.clone(),
            version: self.alertmanager_version.clone(),
            config_reloader_image: self.reloader_image.clone(),
        }
    }
}

pub fn run(args: AlertmanagerArgs) -> Result<()> {
    let documents = render(&args)?;
    write_stream(&mut std::io::stdout().lock(), &documents)
}

/// Render the StatefulSet and Service as two YAML documents
pub fn render(args: &AlertmanagerArgs) -> Result<Vec<String>> {
    let am: Alertmanager = load_one(&args.alertmanager, &Alertmanager::kind(&()))?;
    require_name(&am)?;
    let previous: Option<DeployedStatefulSet> = args
        .previous
        .as_deref()
        .map(|path| load_one(path, "StatefulSet"))
        .transpose()?;

    info!(
        alertmanager = %name_of(&am),
        previous = previous.is_some(),
        "rendering alertmanager manifests"
    );

    let compiled = StatefulSetCompiler::new(args.defaults()).compile(&am, previous.as_ref());
    Ok(vec![
        to_document(&compiled.statefulset)?,
        to_document(&compiled.service)?,
    ])
}
