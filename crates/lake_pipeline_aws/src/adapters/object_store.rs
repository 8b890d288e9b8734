use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("object s3://{bucket}/{key} was not found")]
    NotFound { bucket: String, key: String },
    #[error("failed to {operation} s3://{bucket}/{key}: {message}")]
    Request {
        operation: &'static str,
        bucket: String,
        key: String,
        message: String,
    },
}

pub trait ObjectStore {
    fn put_object(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), StoreError>;

    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Removes `key`; deleting an absent key succeeds.
    fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StoreError>;

    /// Lists every key under `prefix`, in lexicographic order.
    fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StoreError>;
}

/// Process-local store used by tests and dry runs.
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    objects: Mutex<BTreeMap<(String, String), Vec<u8>>>,
    puts: Mutex<Vec<(String, String)>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, bucket: &str, key: &str, body: impl Into<Vec<u8>>) {
        self.lock_objects()
            .insert((bucket.to_string(), key.to_string()), body.into());
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.lock_objects()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.lock_objects()
            .keys()
            .filter(|(object_bucket, _)| object_bucket == bucket)
            .map(|(_, key)| key.clone())
            .collect()
    }

    /// Every `(bucket, key)` passed to `put_object`, in call order.
    pub fn put_log(&self) -> Vec<(String, String)> {
        self.puts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn lock_objects(&self) -> MutexGuard<'_, BTreeMap<(String, String), Vec<u8>>> {
        self.objects.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn put_object(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), StoreError> {
        self.puts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((bucket.to_string(), key.to_string()));
        self.insert(bucket, key, body);
        Ok(())
    }

    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        self.object(bucket, key).ok_or_else(|| StoreError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }

    fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
        self.lock_objects()
            .remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }

    fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .keys(bucket)
            .into_iter()
            .filter(|key| key.starts_with(prefix))
            .collect())
    }
}
