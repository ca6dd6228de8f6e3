//! Alertmanager manifest compilation for sextant
//!
//! This crate compiles an Alertmanager object into the resources that run it:
//!
//! - **StatefulSet**: Replicated Alertmanager pods meshed through stable DNS names
//! - **Service**: Headless governing service exposing the web and mesh ports

#![deny(missing_docs)]

pub mod k8s;
pub mod statefulset;

pub use statefulset::{
    AlertmanagerDefaults, CompiledAlertmanager, StatefulSetCompiler, DEFAULT_BASE_IMAGE,
    DEFAULT_CONFIG_RELOADER_IMAGE, DEFAULT_VERSION,
};
