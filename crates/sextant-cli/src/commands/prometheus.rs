//! Prometheus config command

use std::path::PathBuf;

use clap::Args;
use kube::Resource;
use tracing::info;

use sextant_common::crd::{Prometheus, ServiceMonitor};
use sextant_common::kube_utils::{name_of, object_key, require_name};
use sextant_prometheus::{render_config, ScrapeConfigCompiler};

use super::{load_objects, load_one, to_document, write_stream};
use crate::Result;

#[derive(Args, Debug)]
pub struct PrometheusConfigArgs {
    /// File containing the Prometheus object
    #[arg(long)]
    pub prometheus: PathBuf,

    /// Files containing ServiceMonitor objects (multi-document YAML allowed)
    #[arg(long, num_args = 1.., required = true)]
    pub monitors: Vec<PathBuf>,

    /// Wrap the document in the ConfigMap Prometheus mounts
    #[arg(long)]
    pub config_map: bool,
}

pub fn run(args: PrometheusConfigArgs) -> Result<()> {
    let output = render(&args)?;
    write_stream(&mut std::io::stdout().lock(), &[output])
}

/// Render the configuration document (or its ConfigMap) as YAML
pub fn render(args: &PrometheusConfigArgs) -> Result<String> {
    let prometheus: Prometheus = load_one(&args.prometheus, &Prometheus::kind(&()))?;
    require_name(&prometheus)?;

    let mut monitors = Vec::new();
    for path in &args.monitors {
        monitors.extend(load_objects::<ServiceMonitor>(path, &ServiceMonitor::kind(&()))?);
    }
    for monitor in &monitors {
        require_name(monitor)?;
    }
    let loaded = monitors.len();
    monitors.retain(|m| prometheus.selects(m));
    monitors.sort_by_key(|m| object_key(m));

    info!(
        prometheus = %name_of(&prometheus),
        loaded,
        selected = monitors.len(),
        "rendering prometheus config"
    );

    if args.config_map {
        to_document(&ScrapeConfigCompiler::compile_config_map(&prometheus, &monitors)?)
    } else {
        Ok(render_config(&ScrapeConfigCompiler::compile(&prometheus, &monitors))?)
    }
}
