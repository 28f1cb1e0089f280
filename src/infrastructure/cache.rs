// Disk cache for computed artifacts
//
// Compute-once-per-key persistence. Artifacts are JSON files named
// after the session key; writes go to a temp file in the same
// directory and land with a rename, so a concurrent reader never sees
// a partial artifact. Entries are only ever replaced whole.
use crate::error::ReplayError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;

#[derive(Debug)]
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    /// Open the cache, creating the directory up front (cache
    /// enablement is an explicit construction-time effect, not a
    /// first-access side effect).
    pub fn new(dir: PathBuf) -> Result<Self, ReplayError> {
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Read a cached artifact. Missing file is a miss; an unparsable
    /// file is treated as a miss and logged, so a damaged artifact gets
    /// recomputed instead of wedging the key.
    pub fn read<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, ReplayError> {
        let path = self.path(name);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!("discarding unreadable cache artifact {}: {}", name, e);
                Ok(None)
            }
        }
    }

    /// Raw artifact bytes, for byte-identity checks.
    pub fn read_bytes(&self, name: &str) -> Result<Option<Vec<u8>>, ReplayError> {
        match fs::read(self.path(name)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Atomically replace the artifact: write to `<name>.tmp`, then
    /// rename over the final path.
    pub fn write<T: Serialize>(&self, name: &str, value: &T) -> Result<(), ReplayError> {
        let bytes = serde_json::to_vec(value)
            .map_err(|e| ReplayError::serialization(name, e.to_string()))?;
        let tmp = self.path(&format!("{name}.tmp"));
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, self.path(name))?;
        Ok(())
    }
}

/// Per-key async guards for the recompute path. Concurrent requests for
/// the same uncomputed key serialize here; distinct keys proceed in
/// parallel. Cached reads never touch this.
#[derive(Debug, Default)]
pub struct KeyLocks {
    inner: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the exclusive guard for one key. Holders re-check the cache
    /// before recomputing, so latecomers pick up the freshly written
    /// artifact instead of hitting the provider again.
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().expect("key lock map poisoned");
            map.entry(key.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}
