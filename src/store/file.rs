//! Directory-backed fragment store.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::store::{FragmentStore, StoreError, StoreResult};

/// Stores each fragment as one file inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    fn io_error(path: PathBuf) -> impl FnOnce(std::io::Error) -> StoreError {
        move |source| StoreError::Io { path, source }
    }
}

impl FragmentStore for FileStore {
    fn write(&mut self, file_name: &str, payload: &str) -> StoreResult<()> {
        fs::create_dir_all(&self.dir).map_err(Self::io_error(self.dir.clone()))?;
        let path = self.path(file_name);
        fs::write(&path, payload).map_err(Self::io_error(path))
    }

    fn delete(&mut self, file_name: &str) -> StoreResult<bool> {
        let path = self.path(file_name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::Io { path, source: e }),
        }
    }

    fn read(&self, file_name: &str) -> StoreResult<Option<String>> {
        let path = self.path(file_name);
        match fs::read_to_string(&path) {
            Ok(payload) => Ok(Some(payload)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io { path, source: e }),
        }
    }

    fn entries(&self) -> StoreResult<Vec<(String, String)>> {
        let listing = match fs::read_dir(&self.dir) {
            Ok(listing) => listing,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::Io { path: self.dir.clone(), source: e }),
        };

        let mut names = Vec::new();
        for entry in listing {
            let entry = entry.map_err(Self::io_error(self.dir.clone()))?;
            let file_type = entry.file_type().map_err(Self::io_error(entry.path()))?;
            if !file_type.is_file() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => tracing::warn!(file = ?raw, "Skipping non UTF-8 fragment file"),
            }
        }
        names.sort();

        let mut entries = Vec::with_capacity(names.len());
        for name in names {
            let path = self.path(&name);
            let payload = fs::read_to_string(&path).map_err(Self::io_error(path))?;
            entries.push((name, payload));
        }
        Ok(entries)
    }
}
