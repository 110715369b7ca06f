//! Page-keyed store for per-page intermediates between stages.
//!
//! Entries are JSON compressed with zlib and removed when taken, so a long
//! document holds at most one compressed intermediate per pending page.

use crate::error::{Error, Result};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Compressed page-keyed cache with caller-driven eviction.
#[derive(Debug, Default)]
pub struct PageCache {
    entries: Mutex<HashMap<usize, Vec<u8>>>,
}

impl PageCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<usize, Vec<u8>>>> {
        self.entries
            .lock()
            .map_err(|_| Error::Cache("cache lock poisoned".to_string()))
    }

    /// Store the intermediate of `page`, replacing any previous entry.
    /// Returns the compressed size in bytes.
    pub fn put<T: Serialize>(&self, page: usize, value: &T) -> Result<usize> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::fast());
        serde_json::to_writer(&mut encoder, value)?;
        let bytes = encoder.finish()?;
        let size = bytes.len();
        self.lock()?.insert(page, bytes);
        log::trace!("Cached page {} ({} bytes)", page, size);
        Ok(size)
    }

    /// Remove and decode the intermediate of `page`.
    pub fn take<T: DeserializeOwned>(&self, page: usize) -> Result<T> {
        let bytes = self
            .lock()?
            .remove(&page)
            .ok_or_else(|| Error::Cache(format!("no entry for page {}", page)))?;
        serde_json::from_reader(ZlibDecoder::new(bytes.as_slice()))
            .map_err(|e| Error::Cache(format!("corrupt entry for page {}: {}", page, e)))
    }

    pub fn contains(&self, page: usize) -> bool {
        self.lock().map(|m| m.contains_key(&page)).unwrap_or(false)
    }

    /// Number of pending entries.
    pub fn len(&self) -> usize {
        self.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total compressed bytes held.
    pub fn compressed_size(&self) -> usize {
        self.lock()
            .map(|m| m.values().map(Vec::len).sum())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Rect, Zone, ZoneKind};

    #[test]
    fn test_put_take_evicts() {
        let cache = PageCache::new();
        let zones = vec![
            Zone::new(0, ZoneKind::Body, Rect::new(0.0, 0.0, 10.0, 10.0)),
            Zone::new(1, ZoneKind::Footer, Rect::new(0.0, 20.0, 10.0, 30.0)),
        ];
        assert!(cache.put(4, &zones).unwrap() > 0);
        assert!(cache.contains(4));
        assert_eq!(cache.len(), 1);

        let restored: Vec<Zone> = cache.take(4).unwrap();
        assert_eq!(restored, zones);
        assert!(cache.is_empty());
        assert_eq!(cache.compressed_size(), 0);
    }

    #[test]
    fn test_take_missing_is_cache_error() {
        let cache = PageCache::new();
        let err = cache.take::<Vec<Zone>>(2).unwrap_err();
        assert!(matches!(err, Error::Cache(_)));
    }

    #[test]
    fn test_put_replaces() {
        let cache = PageCache::new();
        cache.put(0, &"first").unwrap();
        cache.put(0, &"second").unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.take::<String>(0).unwrap(), "second");
    }
}
