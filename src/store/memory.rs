//! In-memory fragment store.

use std::collections::BTreeMap;

use crate::store::{FragmentStore, StoreResult};

/// Map-backed store; ordering matches the file store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    fragments: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FragmentStore for MemoryStore {
    fn write(&mut self, file_name: &str, payload: &str) -> StoreResult<()> {
        self.fragments.insert(file_name.to_string(), payload.to_string());
        Ok(())
    }

    fn delete(&mut self, file_name: &str) -> StoreResult<bool> {
        Ok(self.fragments.remove(file_name).is_some())
    }

    fn read(&self, file_name: &str) -> StoreResult<Option<String>> {
        Ok(self.fragments.get(file_name).cloned())
    }

    fn entries(&self) -> StoreResult<Vec<(String, String)>> {
        Ok(self
            .fragments
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overwrite_and_read_all() {
        let mut store = MemoryStore::new();
        store.write("b", "two").unwrap();
        store.write("a", "one").unwrap();
        store.write("b", "TWO").unwrap();
        assert_eq!(store.read_all().unwrap(), "one\nTWO\n");
        assert!(store.contains("a").unwrap());
    }
}
