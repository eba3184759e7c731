//! The externally observed resource carrying fragments.

use serde::Deserialize;
use std::collections::BTreeMap;

/// A tagged key/value bundle as delivered by the watch source.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Bundle {
    pub namespace: String,
    pub name: String,
    pub data: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
}

/// On-disk manifest shape, modelled on a ConfigMap.
#[derive(Debug, Deserialize)]
struct Manifest {
    metadata: ManifestMetadata,
    #[serde(default)]
    data: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct ManifestMetadata {
    #[serde(default = "default_namespace")]
    namespace: String,
    name: String,
    #[serde(default)]
    annotations: BTreeMap<String, String>,
}

fn default_namespace() -> String {
    "default".to_string()
}

impl Bundle {
    /// Create an empty bundle.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder-style helper for attaching an annotation.
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// Builder-style helper for attaching a data entry.
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Parse a ConfigMap-shaped YAML manifest.
    pub fn from_manifest(text: &str) -> Result<Self, serde_yaml::Error> {
        let manifest: Manifest = serde_yaml::from_str(text)?;
        Ok(Self {
            namespace: manifest.metadata.namespace,
            name: manifest.metadata.name,
            data: manifest.data,
            annotations: manifest.metadata.annotations,
        })
    }

    /// Look up an annotation value.
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }

    /// True when data and annotations are identical, independent of order.
    pub fn same_content(&self, other: &Bundle) -> bool {
        self.data == other.data && self.annotations == other.annotations
    }
}
