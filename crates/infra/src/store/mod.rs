//! Whole-collection entity storage.
//!
//! A store holds one collection of entities keyed by integer id and exposes a
//! readers-writer discipline over it:
//!
//! - `read_all` runs under the shared side of the lock; readers overlap.
//! - `write_all` and every composite (`modify`, `create`, `update`, `delete`)
//!   hold the exclusive side for the *entire* read-modify-write span, so two
//!   composites can never both observe the same pre-mutation state.
//!
//! The lock is owned by the store instance (share the store through `Arc`);
//! there is no process-global state.

pub mod in_memory;
pub mod json_file;
pub mod r#trait;

pub use in_memory::InMemoryStore;
pub use json_file::JsonFileStore;
pub use r#trait::{EntityStore, Mutation, Record, StoreError, StoreResult};

use std::future::Future;
use std::time::Duration;

/// Await a lock acquisition, giving up after `limit` when one is configured.
pub(crate) async fn acquire<F>(limit: Option<Duration>, what: &str, fut: F) -> StoreResult<F::Output>
where
    F: Future,
{
    match limit {
        None => Ok(fut.await),
        Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| {
            tracing::warn!(timeout_ms = limit.as_millis() as u64, store = what, "store lock wait timed out");
            StoreError::LockTimeout(limit)
        }),
    }
}
