use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::acquire;
use super::r#trait::{EntityStore, Mutation, Record, StoreResult, StoreError};

/// In-memory store for tests/dev.
///
/// Same locking contract as [`super::JsonFileStore`]. `modify` works on a copy
/// of the collection and swaps it in only on `Commit`, so a failing closure
/// never leaves partial edits behind.
#[derive(Debug)]
pub struct InMemoryStore<E> {
    entities: RwLock<Vec<E>>,
    lock_timeout: Option<Duration>,
}

impl<E> InMemoryStore<E> {
    pub fn new() -> Self {
        Self::with_entities(Vec::new())
    }

    pub fn with_entities(entities: Vec<E>) -> Self {
        Self {
            entities: RwLock::new(entities),
            lock_timeout: None,
        }
    }

    pub fn with_lock_timeout(mut self, lock_timeout: Option<Duration>) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }
}

impl<E> Default for InMemoryStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: Record> EntityStore<E> for InMemoryStore<E> {
    async fn read_all(&self) -> StoreResult<Vec<E>> {
        let entities = acquire(self.lock_timeout, "in-memory", self.entities.read()).await?;
        Ok(entities.clone())
    }

    async fn write_all(&self, entities: Vec<E>) -> StoreResult<()> {
        let mut current = acquire(self.lock_timeout, "in-memory", self.entities.write()).await?;
        *current = entities;
        Ok(())
    }

    async fn modify<R, Err, F>(&self, f: F) -> Result<R, Err>
    where
        F: FnOnce(&mut Vec<E>) -> Result<Mutation<R>, Err> + Send,
        R: Send,
        Err: From<StoreError> + Send,
    {
        let mut current = acquire(self.lock_timeout, "in-memory", self.entities.write()).await?;
        let mut working = current.clone();

        match f(&mut working)? {
            Mutation::Commit(out) => {
                *current = working;
                Ok(out)
            }
            Mutation::Unchanged(out) => Ok(out),
        }
    }
}
