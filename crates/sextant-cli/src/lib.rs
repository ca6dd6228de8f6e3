//! sextant CLI library

pub mod commands;
pub mod error;

pub use error::{Error, Result};

use clap::{Parser, Subcommand};

/// sextant - Prometheus and Alertmanager artifact generation
#[derive(Parser, Debug)]
#[command(name = "sextant")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the ServiceMonitor, Prometheus and Alertmanager CRDs
    Crd,
    /// Render the Prometheus configuration for a Prometheus object
    PrometheusConfig(commands::prometheus::PrometheusConfigArgs),
    /// Render the StatefulSet and Service for an Alertmanager object
    Alertmanager(commands::alertmanager::AlertmanagerArgs),
}

impl Cli {
    /// Run the CLI command
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Crd => commands::crd::run(),
            Commands::PrometheusConfig(args) => commands::prometheus::run(args),
            Commands::Alertmanager(args) => commands::alertmanager::run(args),
        }
    }
}
