use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use binstock_core::Entity;

/// Anything a store can hold: an owned, cloneable, serde-encodable entity.
pub trait Record: Entity + Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> Record for T where T: Entity + Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

/// Store operation error.
///
/// These are storage failures, as opposed to domain errors (missing entities,
/// ledger invariants) which are raised by the services on top.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing file exists but does not decode. Never treated as empty.
    #[error("corrupt store {}: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(String),

    /// `create` was given an entity whose id is already present.
    #[error("duplicate id: {0}")]
    DuplicateId(String),

    /// The bounded lock wait elapsed.
    #[error("timed out after {0:?} waiting for the store lock")]
    LockTimeout(Duration),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Result of a `modify` closure: whether the collection must be written back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation<R> {
    /// Persist the (possibly changed) collection, then return `R`.
    Commit(R),
    /// Return `R` without writing. Any in-memory edits are dropped.
    Unchanged(R),
}

/// Single-collection store with readers-writer semantics.
///
/// Implementations must make `modify` (and therefore every provided
/// composite) appear atomic: nothing may read or write the collection between
/// its load and its write-back. A closure that returns `Err` leaves the
/// collection exactly as it was.
#[async_trait]
pub trait EntityStore<E: Record>: Send + Sync {
    /// Load the full collection. A missing backing file is an empty collection.
    async fn read_all(&self) -> StoreResult<Vec<E>>;

    /// Replace the full collection.
    async fn write_all(&self, entities: Vec<E>) -> StoreResult<()>;

    /// Exclusive read-modify-write over the whole collection.
    async fn modify<R, Err, F>(&self, f: F) -> Result<R, Err>
    where
        F: FnOnce(&mut Vec<E>) -> Result<Mutation<R>, Err> + Send,
        R: Send,
        Err: From<StoreError> + Send;

    async fn get(&self, id: E::Id) -> StoreResult<Option<E>> {
        Ok(self.read_all().await?.into_iter().find(|e| *e.id() == id))
    }

    /// Append `entity`; its id must not be in use.
    async fn create(&self, entity: E) -> StoreResult<E> {
        self.modify(move |all: &mut Vec<E>| -> StoreResult<Mutation<E>> {
            if all.iter().any(|e| e.id() == entity.id()) {
                return Err(StoreError::DuplicateId(entity.id().to_string()));
            }
            all.push(entity.clone());
            Ok(Mutation::Commit(entity))
        })
        .await
    }

    /// Replace the stored entity with the same id. Absent ids are not created.
    async fn update(&self, entity: E) -> StoreResult<Option<E>> {
        self.modify(move |all: &mut Vec<E>| -> StoreResult<Mutation<Option<E>>> {
            match all.iter_mut().find(|e| e.id() == entity.id()) {
                Some(slot) => {
                    *slot = entity.clone();
                    Ok(Mutation::Commit(Some(entity)))
                }
                None => Ok(Mutation::Unchanged(None)),
            }
        })
        .await
    }

    /// Remove and return the entity with `id`.
    async fn delete(&self, id: E::Id) -> StoreResult<Option<E>> {
        self.modify(move |all: &mut Vec<E>| -> StoreResult<Mutation<Option<E>>> {
            match all.iter().position(|e| *e.id() == id) {
                Some(idx) => Ok(Mutation::Commit(Some(all.remove(idx)))),
                None => Ok(Mutation::Unchanged(None)),
            }
        })
        .await
    }
}

#[async_trait]
impl<E, S> EntityStore<E> for Arc<S>
where
    E: Record,
    S: EntityStore<E> + ?Sized,
{
    async fn read_all(&self) -> StoreResult<Vec<E>> {
        (**self).read_all().await
    }

    async fn write_all(&self, entities: Vec<E>) -> StoreResult<()> {
        (**self).write_all(entities).await
    }

    async fn modify<R, Err, F>(&self, f: F) -> Result<R, Err>
    where
        F: FnOnce(&mut Vec<E>) -> Result<Mutation<R>, Err> + Send,
        R: Send,
        Err: From<StoreError> + Send,
    {
        (**self).modify(f).await
    }
}
