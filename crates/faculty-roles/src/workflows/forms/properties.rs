use std::collections::BTreeMap;
use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

pub const FORM_ID_KEY: &str = "INTEREST_FORM_ID";
pub const RESPONSE_SHEET_ID_KEY: &str = "RESPONSE_SHEET_ID";
pub const FORM_LAYOUT_KEY: &str = "INTEREST_FORM_LAYOUT";

#[derive(Debug, thiserror::Error)]
pub enum PropertyStoreError {
    #[error("property store i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("property store is corrupt: {0}")]
    Format(#[from] serde_json::Error),
}

/// Durable string key/value storage that survives restarts.
pub trait PropertyStore: Debug + Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, PropertyStoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), PropertyStoreError>;
    fn clear(&self, key: &str) -> Result<(), PropertyStoreError>;
}

#[derive(Debug, Default)]
pub struct InMemoryPropertyStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl InMemoryPropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(self, key: &str, value: &str) -> Self {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        self
    }
}

impl PropertyStore for InMemoryPropertyStore {
    fn get(&self, key: &str) -> Result<Option<String>, PropertyStoreError> {
        Ok(self
            .values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PropertyStoreError> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<(), PropertyStoreError> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

/// Properties kept as a flat JSON object on disk. Writes go to a sibling
/// temp file first and are renamed into place.
#[derive(Debug)]
pub struct JsonFilePropertyStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFilePropertyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, PropertyStoreError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, values: &BTreeMap<String, String>) -> Result<(), PropertyStoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(values)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn update<F>(&self, change: F) -> Result<(), PropertyStoreError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut values = self.load()?;
        change(&mut values);
        self.save(&values)
    }
}

impl PropertyStore for JsonFilePropertyStore {
    fn get(&self, key: &str) -> Result<Option<String>, PropertyStoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PropertyStoreError> {
        self.update(|values| {
            values.insert(key.to_string(), value.to_string());
        })
    }

    fn clear(&self, key: &str) -> Result<(), PropertyStoreError> {
        self.update(|values| {
            values.remove(key);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_store_persists_across_instances() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state").join("properties.json");

        let store = JsonFilePropertyStore::new(&path);
        assert_eq!(store.get(FORM_ID_KEY).expect("read"), None);
        store.set(FORM_ID_KEY, "form-123").expect("write");
        store.set(RESPONSE_SHEET_ID_KEY, "sheet-9").expect("write");

        let reopened = JsonFilePropertyStore::new(&path);
        assert_eq!(
            reopened.get(FORM_ID_KEY).expect("read").as_deref(),
            Some("form-123")
        );

        reopened.clear(FORM_ID_KEY).expect("clear");
        assert_eq!(store.get(FORM_ID_KEY).expect("read"), None);
        assert_eq!(
            store.get(RESPONSE_SHEET_ID_KEY).expect("read").as_deref(),
            Some("sheet-9")
        );
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("properties.json");
        fs::write(&path, "not json").expect("seed file");

        let store = JsonFilePropertyStore::new(&path);
        assert!(matches!(
            store.get(FORM_ID_KEY),
            Err(PropertyStoreError::Format(_))
        ));
    }

    #[test]
    fn memory_store_clears_keys() {
        let store = InMemoryPropertyStore::new().with_value(FORM_ID_KEY, "form-1");
        store.clear(FORM_ID_KEY).expect("clear");
        assert_eq!(store.get(FORM_ID_KEY).expect("read"), None);
    }
}
