//! Shared field types for the monitoring CRDs

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Kubernetes `IntOrString`: a port given by number or by name.
///
/// The zero value (`Int(0)`) and the empty string both mean "unset".
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(untagged)]
pub enum IntOrString {
    /// Numeric form
    Int(i32),
    /// String form
    String(String),
}

impl Default for IntOrString {
    fn default() -> Self {
        Self::Int(0)
    }
}

impl IntOrString {
    /// Whether this value carries anything
    pub fn is_set(&self) -> bool {
        match self {
            Self::Int(n) => *n != 0,
            Self::String(s) => !s.is_empty(),
        }
    }

    /// Inverse of [`is_set`](Self::is_set), for `skip_serializing_if`
    pub fn is_unset(&self) -> bool {
        !self.is_set()
    }
}

impl fmt::Display for IntOrString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{}", n),
            Self::String(s) => write!(f, "{}", s),
        }
    }
}

/// A resolved port reference.
///
/// Endpoints carry a named service port plus an int-or-string target port.
/// At most one of them drives port filtering; this enum is the result of
/// applying that precedence once, so consumers match on it exhaustively.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PortRef<'a> {
    /// Named service port (`port`)
    Named(&'a str),
    /// Target port given as a container port name
    TargetName(&'a str),
    /// Target port given as a container port number
    TargetNumber(i32),
    /// No port given
    Unset,
}

impl<'a> PortRef<'a> {
    /// Resolve a named port and a target port: named first, then string
    /// target, then nonzero numeric target.
    pub fn resolve(port: &'a str, target_port: &'a IntOrString) -> Self {
        if !port.is_empty() {
            return Self::Named(port);
        }
        Self::from_target(target_port)
    }

    /// Resolve a bare int-or-string port with no named-port form.
    pub fn from_target(target_port: &'a IntOrString) -> Self {
        match target_port {
            IntOrString::String(name) if !name.is_empty() => Self::TargetName(name),
            IntOrString::Int(number) if *number != 0 => Self::TargetNumber(*number),
            _ => Self::Unset,
        }
    }

    /// The name this reference contributes to a job label, if any.
    ///
    /// Numeric target ports do not name jobs.
    pub fn job_suffix(&self) -> Option<&'a str> {
        match *self {
            Self::Named(name) | Self::TargetName(name) => Some(name),
            Self::TargetNumber(_) | Self::Unset => None,
        }
    }
}
