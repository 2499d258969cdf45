//! Durable key/value storage. This is the only thing the document store
//! knows about persistence: read a string by key, overwrite a string by key.

use super::errors::StorageError;
use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
};
use uuid::Uuid;

pub trait Storage: Send {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// One `<key>.json` file per key inside `dir`.
#[derive(Debug)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(v) => Ok(Some(v)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        // Write next to the target and rename over it, so a crash mid-write
        // leaves the previous record intact.
        let tmp = temp_path_for(&path);
        let written =
            fs::write(&tmp, value).and_then(|()| fs::rename(&tmp, &path));
        if let Err(e) = written {
            fs::remove_file(&tmp).ok();
            return Err(e.into());
        }

        Ok(())
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()))
}

/// In-process storage. The optional quota (in bytes, summed over all values)
/// behaves like a browser's local storage limit.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        Self {
            items: HashMap::new(),
            quota: Some(quota),
        }
    }

    pub fn with_item(mut self, key: &str, value: &str) -> Self {
        self.items.insert(key.to_string(), value.to_string());
        self
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(quota) = self.quota {
            let others: usize = self
                .items
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(_, v)| v.len())
                .sum();
            let needed = others + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded { needed, quota });
            }
        }
        self.items.insert(key.to_string(), value.to_string());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir()
            .join(format!("bizdesk-storage-{}", Uuid::new_v4().simple()))
    }

    #[test]
    fn test_file_storage_missing_key_is_none() {
        let storage = FileStorage::new(scratch_dir());
        assert!(storage.get_item("nope").expect("read").is_none());
    }

    #[test]
    fn test_file_storage_overwrites() {
        let dir = scratch_dir();
        let mut storage = FileStorage::new(&dir);
        storage.set_item("doc", "{\"a\":1}").expect("first write");
        storage.set_item("doc", "{\"a\":2}").expect("second write");

        assert_eq!(
            storage.get_item("doc").expect("read").as_deref(),
            Some("{\"a\":2}")
        );
        // no temp files left behind
        assert_eq!(temp_files_in(&dir), 0);

        fs::remove_dir_all(dir).ok();
    }

    fn temp_files_in(dir: &Path) -> usize {
        fs::read_dir(dir)
            .expect("dir exists")
            .filter_map(|e| e.ok())
            .filter(|e| e.path().to_string_lossy().ends_with(".tmp"))
            .count()
    }

    #[test]
    fn test_file_storage_failed_write_cleans_up() {
        let dir = scratch_dir();
        // a non-empty directory where the record should go makes the rename
        // fail after the temp file was written
        fs::create_dir_all(dir.join("doc.json").join("occupied"))
            .expect("create blocker");
        let mut storage = FileStorage::new(&dir);

        let err = storage.set_item("doc", "{}").unwrap_err();
        assert!(matches!(err, StorageError::Io(_)));
        assert_eq!(temp_files_in(&dir), 0);

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_memory_storage_quota() {
        let mut storage = MemoryStorage::with_quota(8);
        storage.set_item("k", "12345678").expect("fits exactly");
        let err = storage.set_item("k", "123456789").unwrap_err();
        assert!(matches!(
            err,
            StorageError::QuotaExceeded {
                needed: 9,
                quota: 8
            }
        ));
        // the failed write did not clobber the old value
        assert_eq!(
            storage.get_item("k").expect("read").as_deref(),
            Some("12345678")
        );
    }
}
