use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::error::StorageError;
use crate::traits::{BatchOp, KvPairs, KvStore};

/// Pending overlay entry: `Some` is a write, `None` a delete.
type Overlay = BTreeMap<Vec<u8>, Option<Vec<u8>>>;

/// Write-buffering branch over a parent store.
///
/// Reads fall through to the parent unless the key was touched in this
/// branch. Nothing reaches the parent until [`CacheStore::write`] is called;
/// dropping the branch discards every buffered change.
pub struct CacheStore {
    parent: Arc<dyn KvStore>,
    overlay: RwLock<Overlay>,
}

impl CacheStore {
    pub fn new(parent: Arc<dyn KvStore>) -> Self {
        Self {
            parent,
            overlay: RwLock::new(BTreeMap::new()),
        }
    }

    /// Flush all buffered writes and deletes into the parent as one batch.
    pub fn write(&self) -> Result<(), StorageError> {
        let mut overlay = self.overlay.write().map_err(|e| StorageError::BatchError {
            reason: e.to_string(),
        })?;
        let ops = std::mem::take(&mut *overlay)
            .into_iter()
            .map(|(key, value)| match value {
                Some(value) => BatchOp::Put { key, value },
                None => BatchOp::Delete { key },
            })
            .collect();
        self.parent.write_batch(ops)
    }

    /// Number of keys touched in this branch.
    pub fn dirty_len(&self) -> usize {
        self.overlay.read().map(|o| o.len()).unwrap_or(0)
    }
}

impl KvStore for CacheStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let overlay = self.overlay.read().map_err(|e| StorageError::ReadError {
            reason: e.to_string(),
        })?;
        match overlay.get(key) {
            Some(entry) => Ok(entry.clone()),
            None => self.parent.get(key),
        }
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        let mut overlay = self.overlay.write().map_err(|e| StorageError::WriteError {
            reason: e.to_string(),
        })?;
        overlay.insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), StorageError> {
        let mut overlay = self.overlay.write().map_err(|e| StorageError::WriteError {
            reason: e.to_string(),
        })?;
        overlay.insert(key.to_vec(), None);
        Ok(())
    }

    fn exists(&self, key: &[u8]) -> Result<bool, StorageError> {
        Ok(self.get(key)?.is_some())
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<KvPairs, StorageError> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.parent.prefix_scan(prefix)?.into_iter().collect();
        let overlay = self.overlay.read().map_err(|e| StorageError::ReadError {
            reason: e.to_string(),
        })?;
        for (key, value) in overlay
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
        {
            match value {
                Some(v) => {
                    merged.insert(key.clone(), v.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        Ok(merged.into_iter().collect())
    }

    fn write_batch(&self, ops: Vec<BatchOp>) -> Result<(), StorageError> {
        let mut overlay = self.overlay.write().map_err(|e| StorageError::BatchError {
            reason: e.to_string(),
        })?;
        for op in ops {
            match op {
                BatchOp::Put { key, value } => {
                    overlay.insert(key, Some(value));
                }
                BatchOp::Delete { key } => {
                    overlay.insert(key, None);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    fn parent_with(entries: &[(&[u8], &[u8])]) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        for (k, v) in entries {
            store.put(k, v).unwrap();
        }
        store
    }

    #[test]
    fn test_reads_fall_through() {
        let parent = parent_with(&[(b"a", b"1")]);
        let cache = CacheStore::new(parent.clone());
        assert_eq!(cache.get(b"a").unwrap(), Some(b"1".to_vec()));
    }

    #[test]
    fn test_writes_invisible_until_flushed() {
        let parent = parent_with(&[(b"a", b"1")]);
        let cache = CacheStore::new(parent.clone());
        cache.put(b"a", b"2").unwrap();
        cache.put(b"b", b"3").unwrap();

        assert_eq!(cache.get(b"a").unwrap(), Some(b"2".to_vec()));
        assert_eq!(parent.get(b"a").unwrap(), Some(b"1".to_vec()));
        assert!(!parent.exists(b"b").unwrap());

        cache.write().unwrap();
        assert_eq!(parent.get(b"a").unwrap(), Some(b"2".to_vec()));
        assert_eq!(parent.get(b"b").unwrap(), Some(b"3".to_vec()));
        assert_eq!(cache.dirty_len(), 0);
    }

    #[test]
    fn test_drop_discards() {
        let parent = parent_with(&[(b"a", b"1")]);
        {
            let cache = CacheStore::new(parent.clone());
            cache.delete(b"a").unwrap();
            assert!(!cache.exists(b"a").unwrap());
        }
        assert_eq!(parent.get(b"a").unwrap(), Some(b"1".to_vec()));
    }

    #[test]
    fn test_prefix_scan_merges_overlay() {
        let parent = parent_with(&[(b"p/a", b"1"), (b"p/b", b"2"), (b"q/a", b"9")]);
        let cache = CacheStore::new(parent.clone());
        cache.delete(b"p/a").unwrap();
        cache.put(b"p/c", b"3").unwrap();

        let results = cache.prefix_scan(b"p/").unwrap();
        let keys: Vec<_> = results.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(keys, vec![b"p/b".to_vec(), b"p/c".to_vec()]);
    }

    #[test]
    fn test_nested_branches() {
        let parent = parent_with(&[]);
        let outer = Arc::new(CacheStore::new(parent.clone()));
        let inner = CacheStore::new(outer.clone());
        inner.put(b"k", b"v").unwrap();
        inner.write().unwrap();

        assert_eq!(outer.get(b"k").unwrap(), Some(b"v".to_vec()));
        assert!(!parent.exists(b"k").unwrap());

        outer.write().unwrap();
        assert!(parent.exists(b"k").unwrap());
    }
}
