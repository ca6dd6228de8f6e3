//! CRD command

use kube::CustomResourceExt;

use sextant_common::crd::{Alertmanager, Prometheus, ServiceMonitor};

use super::{to_document, write_stream};
use crate::Result;

pub fn run() -> Result<()> {
    write_stream(&mut std::io::stdout().lock(), &render()?)
}

/// One YAML document per CRD
pub fn render() -> Result<Vec<String>> {
    Ok(vec![
        to_document(&ServiceMonitor::crd())?,
        to_document(&Prometheus::crd())?,
        to_document(&Alertmanager::crd())?,
    ])
}
