use std::collections::HashSet;
use std::io::{self, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};


use super::acquire;
use super::r#trait::{EntityStore, Mutation, Record, StoreError, StoreResult};

/// Store backed by one UTF-8 file holding a single JSON array.
///
/// - The lock is a `tokio::sync::RwLock`, which queues waiters fairly, so a
///   steady stream of readers cannot starve a writer.
/// - Writes never touch the target in place: the collection is written to a
///   temporary file in the same directory, fsynced, then renamed over the
///   target. Readers see either the old or the new collection, never a
///   prefix, and a failed write leaves the previous file as it was.
/// - The write guard travels into the blocking write task, so the lock is
///   held until the rename completes even if the calling future is dropped.
pub struct JsonFileStore<E> {
    path: PathBuf,
    lock: Arc<RwLock<()>>,
    lock_timeout: Option<Duration>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Record> JsonFileStore<E> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(RwLock::new(())),
            lock_timeout: None,
            _entity: PhantomData,
        }
    }

    /// Bound how long an operation waits for the lock. `None` waits forever.
    pub fn with_lock_timeout(mut self, lock_timeout: Option<Duration>) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    async fn lock_exclusive(&self) -> StoreResult<OwnedRwLockWriteGuard<()>> {
        acquire(
            self.lock_timeout,
            &self.path.to_string_lossy(),
            self.lock.clone().write_owned(),
        )
        .await
    }

    /// Decode the backing file. Caller holds the lock.
    async fn load(&self) -> StoreResult<Vec<E>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "store file absent; empty collection");
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let entities: Vec<E> = serde_json::from_slice(&bytes).map_err(|e| self.corrupt(e.to_string()))?;

        let mut seen = HashSet::with_capacity(entities.len());
        if let Some(dup) = entities.iter().map(|e| *e.id()).find(|id| !seen.insert(*id)) {
            return Err(self.corrupt(format!("id {dup} appears more than once")));
        }

        tracing::debug!(path = %self.path.display(), count = entities.len(), "store loaded");
        Ok(entities)
    }

    fn corrupt(&self, reason: String) -> StoreError {
        tracing::warn!(path = %self.path.display(), %reason, "store file does not decode");
        StoreError::Corrupt {
            path: self.path.clone(),
            reason,
        }
    }

    /// Atomically replace the backing file, releasing `guard` once done.
    async fn persist(&self, entities: &[E], guard: OwnedRwLockWriteGuard<()>) -> StoreResult<()> {
        let bytes =
            serde_json::to_vec_pretty(entities).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let path = self.path.clone();
        let count = entities.len();

        tokio::task::spawn_blocking(move || {
            let result = replace_file(&path, &bytes);
            drop(guard);
            result
        })
        .await
        .map_err(|e| self.io_error(io::Error::other(e)))?
        .map_err(|e| self.io_error(e))?;

        tracing::debug!(path = %self.path.display(), count, "store persisted");
        Ok(())
    }
}

/// Write `bytes` next to `path` and rename over it.
fn replace_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    // Make the rename itself durable.
    #[cfg(unix)]
    std::fs::File::open(dir)?.sync_all()?;
    Ok(())
}

#[async_trait]
impl<E: Record> EntityStore<E> for JsonFileStore<E> {
    async fn read_all(&self) -> StoreResult<Vec<E>> {
        let _guard = acquire(self.lock_timeout, &self.path.to_string_lossy(), self.lock.read()).await?;
        self.load().await
    }

    async fn write_all(&self, entities: Vec<E>) -> StoreResult<()> {
        let guard = self.lock_exclusive().await?;
        self.persist(&entities, guard).await
    }

    async fn modify<R, Err, F>(&self, f: F) -> Result<R, Err>
    where
        F: FnOnce(&mut Vec<E>) -> Result<Mutation<R>, Err> + Send,
        R: Send,
        Err: From<StoreError> + Send,
    {
        let guard = self.lock_exclusive().await?;
        let mut entities = self.load().await?;

        match f(&mut entities)? {
            Mutation::Commit(out) => {
                self.persist(&entities, guard).await?;
                Ok(out)
            }
            Mutation::Unchanged(out) => Ok(out),
        }
    }
}

impl<E> std::fmt::Debug for JsonFileStore<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonFileStore")
            .field("path", &self.path)
            .field("lock_timeout", &self.lock_timeout)
            .finish()
    }
}
