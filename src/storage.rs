//! Defines the object storage collaborator used for profile pictures.

use std::{
    collections::HashMap,
    fs, io,
    path::PathBuf,
    sync::Mutex,
};

use crate::Error;

/// The result of uploading an object: where clients can fetch it, and the key
/// needed to delete it later.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    pub url: String,
    pub key: String,
}

/// Stores opaque byte blobs under string keys.
///
/// The application never touches storage credentials; implementations own
/// them. Deleting a missing key is not an error.
pub trait ObjectStorage: Send + Sync {
    /// Store `bytes` under `key` and return the stored object's URL and key.
    fn put(&self, key: &str, content_type: &str, bytes: &[u8]) -> Result<StoredObject, Error>;

    /// Delete the object stored under `key`, if any.
    fn delete(&self, key: &str) -> Result<(), Error>;
}

/// An in-process object store. Objects do not survive a restart, so this is
/// only suitable for tests and local development.
#[derive(Debug, Default)]
pub struct MemoryObjectStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryObjectStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    /// Whether the store holds no objects.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether an object is stored under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }
}

impl ObjectStorage for MemoryObjectStorage {
    fn put(&self, key: &str, _content_type: &str, bytes: &[u8]) -> Result<StoredObject, Error> {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_owned(), bytes.to_vec());

        Ok(StoredObject {
            url: format!("memory://{key}"),
            key: key.to_owned(),
        })
    }

    fn delete(&self, key: &str) -> Result<(), Error> {
        self.objects.lock().unwrap().remove(key);

        Ok(())
    }
}

/// Object storage backed by a directory on the local filesystem. The stored
/// files are served by the router under `url_prefix`.
#[derive(Debug)]
pub struct LocalObjectStorage {
    root: PathBuf,
    url_prefix: String,
}

impl LocalObjectStorage {
    /// Store objects under `root`, served at `url_prefix`.
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.into(),
        }
    }

    fn object_path(&self, key: &str) -> Result<PathBuf, Error> {
        // Keys are server-generated, but a traversal check costs nothing.
        if key.split('/').any(|part| part == ".." || part.is_empty()) {
            return Err(Error::StorageError(format!("invalid object key {key:?}")));
        }

        Ok(self.root.join(key))
    }
}

impl ObjectStorage for LocalObjectStorage {
    fn put(&self, key: &str, _content_type: &str, bytes: &[u8]) -> Result<StoredObject, Error> {
        let path = self.object_path(key)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|error| Error::StorageError(error.to_string()))?;
        }
        fs::write(&path, bytes).map_err(|error| Error::StorageError(error.to_string()))?;

        Ok(StoredObject {
            url: format!("{}/{key}", self.url_prefix),
            key: key.to_owned(),
        })
    }

    fn delete(&self, key: &str) -> Result<(), Error> {
        let path = self.object_path(key)?;

        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(Error::StorageError(error.to_string())),
        }
    }
}

#[cfg(test)]
mod local_object_storage_tests {
    use super::{LocalObjectStorage, ObjectStorage};

    #[test]
    fn put_writes_file_and_builds_url() {
        let dir = std::env::temp_dir().join(format!("uploads_test_{}", std::process::id()));
        let storage = LocalObjectStorage::new(&dir, "/uploads");

        let stored = storage.put("avatars/1.png", "image/png", &[1, 2, 3]).unwrap();

        assert_eq!(stored.url, "/uploads/avatars/1.png");
        assert_eq!(std::fs::read(dir.join("avatars/1.png")).unwrap(), [1, 2, 3]);

        storage.delete("avatars/1.png").unwrap();
        assert!(!dir.join("avatars/1.png").exists());

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn traversal_keys_are_rejected() {
        let storage = LocalObjectStorage::new("/tmp/uploads", "/uploads");

        assert!(storage.put("../escape.png", "image/png", &[]).is_err());
        assert!(storage.delete("avatars/../../etc/passwd").is_err());
    }
}
