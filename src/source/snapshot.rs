//! Point-in-time view of the bundle directory.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::fragment::Bundle;
use crate::source::{BundleEvent, SourceError};

/// Parsed manifests keyed by file path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    files: BTreeMap<PathBuf, Bundle>,
}

impl Snapshot {
    /// Read every manifest in `dir`.
    ///
    /// Files that cannot be read or parsed keep their entry from `previous`.
    /// A missing directory yields an empty snapshot.
    pub fn scan(dir: &Path, previous: &Snapshot) -> Result<Self, SourceError> {
        let io_error = |source: std::io::Error| SourceError::Io {
            path: dir.to_path_buf(),
            source,
        };
        let read_dir = match fs::read_dir(dir) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(io_error(e)),
        };

        let mut files = BTreeMap::new();
        for entry in read_dir {
            let path = entry.map_err(io_error)?.path();
            if !is_manifest(&path) {
                continue;
            }

            let parsed = fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|text| Bundle::from_manifest(&text).map_err(|e| e.to_string()));
            match parsed {
                Ok(bundle) => {
                    files.insert(path, bundle);
                }
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "Skipping unreadable manifest");
                    if let Some(old) = previous.files.get(&path) {
                        files.insert(path, old.clone());
                    }
                }
            }
        }
        Ok(Self { files })
    }

    /// Keep only bundles from `namespace`; `None` keeps everything.
    pub fn in_namespace(mut self, namespace: Option<&str>) -> Self {
        if let Some(namespace) = namespace {
            self.files.retain(|path, bundle| {
                let keep = bundle.namespace == namespace;
                if !keep {
                    tracing::debug!(
                        path = %path.display(),
                        namespace = %bundle.namespace,
                        "Ignoring manifest outside the watched namespace"
                    );
                }
                keep
            });
        }
        self
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Bundles keyed by `(namespace, name)`; on a clash the last file wins.
    pub fn bundles(&self) -> BTreeMap<(String, String), &Bundle> {
        let mut out = BTreeMap::new();
        for (path, bundle) in &self.files {
            let key = (bundle.namespace.clone(), bundle.name.clone());
            if out.insert(key, bundle).is_some() {
                tracing::warn!(
                    path = %path.display(),
                    namespace = %bundle.namespace,
                    name = %bundle.name,
                    "Bundle defined in more than one manifest"
                );
            }
        }
        out
    }

    /// Events that turn `self` into `next`.
    pub fn diff(&self, next: &Snapshot) -> Vec<BundleEvent> {
        let before = self.bundles();
        let after = next.bundles();
        let mut events = Vec::new();

        for (key, new) in &after {
            match before.get(key) {
                None => events.push(BundleEvent::Create((*new).clone())),
                Some(old) if old != new => {
                    events.push(BundleEvent::Update((*old).clone(), (*new).clone()))
                }
                Some(_) => {}
            }
        }
        for (key, old) in &before {
            if !after.contains_key(key) {
                events.push(BundleEvent::Delete((*old).clone()));
            }
        }
        events
    }

    /// `Update(b, b)` for every bundle.
    pub fn resync_events(&self) -> Vec<BundleEvent> {
        self.bundles()
            .into_values()
            .map(|b| BundleEvent::Update(b.clone(), b.clone()))
            .collect()
    }
}

fn is_manifest(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|n| n.to_str())
        .map_or(true, |n| n.starts_with('.'));
    let yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    );
    path.is_file() && yaml && !hidden
}
