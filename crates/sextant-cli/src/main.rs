//! sextant CLI
//!
//! Renders Prometheus configuration and Alertmanager manifests from
//! monitoring custom resources stored as YAML files.

use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sextant_cli::{Cli, Result};

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries only rendered YAML
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    cli.run()
}
