//! CLI commands

use std::io::Write;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

pub mod alertmanager;
pub mod crd;
pub mod prometheus;

/// Header every object in a manifest file carries
#[derive(Deserialize)]
struct TypeMeta {
    #[serde(default)]
    kind: String,
}

/// Load every object of `kind` from a (possibly multi-document) YAML file.
///
/// Empty documents and objects of other kinds are skipped.
pub fn load_objects<T: DeserializeOwned>(path: &Path, kind: &str) -> Result<Vec<T>> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    let mut objects = Vec::new();
    for document in serde_yaml::Deserializer::from_str(&content) {
        let value = serde_yaml::Value::deserialize(document)?;
        if value.is_null() {
            continue;
        }

        let meta: TypeMeta = serde_yaml::from_value(value.clone())?;
        if meta.kind != kind {
            debug!(path = %path.display(), kind = %meta.kind, "skipping document");
            continue;
        }

        let object = serde_yaml::from_value(value).map_err(|source| Error::InvalidObject {
            path: path.to_path_buf(),
            kind: kind.to_string(),
            source,
        })?;
        objects.push(object);
    }
    Ok(objects)
}

/// Load the single object of `kind` from a YAML file
pub fn load_one<T: DeserializeOwned>(path: &Path, kind: &str) -> Result<T> {
    let mut objects = load_objects(path, kind)?;
    match objects.len() {
        1 => Ok(objects.remove(0)),
        found => Err(Error::object_count(path, kind, found)),
    }
}

/// Serialize one object as a YAML document
pub fn to_document<T: Serialize>(object: &T) -> Result<String> {
    Ok(serde_yaml::to_string(object)?)
}

/// Write documents as a `---` separated YAML stream
pub fn write_stream(out: &mut impl Write, documents: &[String]) -> Result<()> {
    for doc in documents {
        writeln!(out, "---")?;
        out.write_all(doc.as_bytes())?;
    }
    out.flush()?;
    Ok(())
}
