//! Catalog facade: items + bins + the item delete policy.
//!
//! Items and bins live in separate collections with separate locks. The
//! delete policy therefore spans two composites and is not a transaction:
//! with `Block`, a bin may start tracking the item between the check and the
//! delete; with `Cascade`, readers may briefly see the item gone from the
//! catalog but still present in a ledger. `Cascade` reads the bins before
//! deleting, so an unreadable bins file fails the call with nothing changed;
//! a failure after the item delete (e.g. a lock timeout) leaves the item
//! deleted and the ledgers untouched, and a retry reports `NotFound`.

use binstock_core::{DomainError, ItemId};
use binstock_inventory::{Bin, Item};

use crate::config::{CatalogConfig, ItemDeletePolicy};
use crate::services::{BinService, CatalogResult, ItemCatalog};
use crate::store::{EntityStore, JsonFileStore};

/// Catalog persisted as two JSON files under one data directory.
pub type FileCatalog = Catalog<JsonFileStore<Item>, JsonFileStore<Bin>>;

#[derive(Debug)]
pub struct Catalog<IS, BS> {
    items: ItemCatalog<IS>,
    bins: BinService<BS>,
    delete_policy: ItemDeletePolicy,
}

impl FileCatalog {
    /// Open (lazily; nothing is read until the first operation) the
    /// collections under `config.data_dir`.
    pub fn open(config: &CatalogConfig) -> Self {
        tracing::info!(
            data_dir = %config.data_dir().display(),
            lock_timeout = ?config.lock_timeout,
            delete_policy = ?config.item_delete_policy,
            "opening catalog"
        );

        let items = JsonFileStore::new(config.items_path()).with_lock_timeout(config.lock_timeout);
        let bins = JsonFileStore::new(config.bins_path()).with_lock_timeout(config.lock_timeout);
        Self::new(items, bins, config.item_delete_policy)
    }
}

impl<IS, BS> Catalog<IS, BS>
where
    IS: EntityStore<Item>,
    BS: EntityStore<Bin>,
{
    pub fn new(items: IS, bins: BS, delete_policy: ItemDeletePolicy) -> Self {
        Self {
            items: ItemCatalog::new(items),
            bins: BinService::new(bins),
            delete_policy,
        }
    }

    pub fn items(&self) -> &ItemCatalog<IS> {
        &self.items
    }

    pub fn bins(&self) -> &BinService<BS> {
        &self.bins
    }

    pub fn delete_policy(&self) -> ItemDeletePolicy {
        self.delete_policy
    }

    /// Delete an item, applying the configured policy to bins that track it.
    pub async fn delete_item(&self, item_id: ItemId) -> CatalogResult<Item> {
        match self.delete_policy {
            ItemDeletePolicy::Orphan => self.items.delete(item_id).await,
            ItemDeletePolicy::Block => {
                // Surface NotFound before any conflict about ledgers.
                self.items.get(item_id).await?;

                let tracking = self.bins.bins_tracking(item_id).await?;
                if !tracking.is_empty() {
                    let ids: Vec<String> = tracking.iter().map(|b| b.id_typed().to_string()).collect();
                    tracing::debug!(%item_id, bins = ?ids, "item delete blocked by ledgers");
                    return Err(DomainError::conflict(format!(
                        "item {item_id} is still tracked in bins [{}]",
                        ids.join(", ")
                    ))
                    .into());
                }
                self.items.delete(item_id).await
            }
            ItemDeletePolicy::Cascade => {
                self.bins.bins_tracking(item_id).await?;
                let item = self.items.delete(item_id).await?;
                self.bins.untrack_everywhere(item_id).await?;
                Ok(item)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::CatalogError;
    use crate::store::{InMemoryStore, StoreError};
    use binstock_core::BinId;
    use binstock_inventory::NewItem;

    type MemCatalog = Catalog<InMemoryStore<Item>, InMemoryStore<Bin>>;

    async fn tracked_bolt(policy: ItemDeletePolicy) -> (MemCatalog, ItemId) {
        let catalog = Catalog::new(InMemoryStore::new(), InMemoryStore::new(), policy);
        let (item_id, _) = catalog.items().create(NewItem::new("bolt")).await.unwrap();
        let (bin_id, _) = catalog.bins().create("bolts").await.unwrap();
        catalog.bins().add_item(bin_id, item_id).await.unwrap();
        catalog.bins().update_item_quantity(bin_id, item_id, 3).await.unwrap();
        (catalog, item_id)
    }

    #[tokio::test]
    async fn orphan_leaves_ledger_reference() {
        let (catalog, item_id) = tracked_bolt(ItemDeletePolicy::Orphan).await;
        catalog.delete_item(item_id).await.unwrap();

        assert!(catalog.items().get(item_id).await.unwrap_err().is_not_found());
        assert_eq!(catalog.bins().bins_tracking(item_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn block_refuses_while_tracked() {
        let (catalog, item_id) = tracked_bolt(ItemDeletePolicy::Block).await;

        let err = catalog.delete_item(item_id).await.unwrap_err();
        assert!(err.is_conflict());
        assert!(err.to_string().contains("[1]"));
        assert!(catalog.items().get(item_id).await.is_ok());

        catalog.bins().remove_item(BinId::new(1), item_id).await.unwrap();
        catalog.delete_item(item_id).await.unwrap();
    }

    #[tokio::test]
    async fn block_reports_missing_item_as_not_found() {
        let catalog: MemCatalog = Catalog::new(InMemoryStore::new(), InMemoryStore::new(), ItemDeletePolicy::Block);
        assert!(catalog.delete_item(ItemId::new(5)).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn cascade_clears_ledgers() {
        let (catalog, item_id) = tracked_bolt(ItemDeletePolicy::Cascade).await;
        catalog.delete_item(item_id).await.unwrap();

        assert!(catalog.bins().bins_tracking(item_id).await.unwrap().is_empty());
        assert!(catalog.delete_item(item_id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn cascade_with_unreadable_bins_keeps_item() {
        let dir = tempfile::tempdir().unwrap();
        let config = CatalogConfig::new(dir.path()).with_item_delete_policy(ItemDeletePolicy::Cascade);
        let catalog = FileCatalog::open(&config);
        let (item_id, _) = catalog.items().create(NewItem::new("bolt")).await.unwrap();
        std::fs::write(config.bins_path(), b"{ not json").unwrap();

        let err = catalog.delete_item(item_id).await.unwrap_err();
        assert!(matches!(err, CatalogError::Store(StoreError::Corrupt { .. })));
        assert!(catalog.items().get(item_id).await.is_ok());
    }

    #[tokio::test]
    async fn file_catalog_uses_configured_paths() {
        let dir = tempfile::tempdir().unwrap();
        let config = CatalogConfig::new(dir.path())
            .with_lock_timeout(std::time::Duration::from_secs(5))
            .with_item_delete_policy(ItemDeletePolicy::Block);
        let catalog = FileCatalog::open(&config);
        assert_eq!(catalog.delete_policy(), ItemDeletePolicy::Block);

        catalog.items().create(NewItem::new("bolt")).await.unwrap();
        catalog.bins().create("bolts").await.unwrap();

        assert!(config.items_path().is_file());
        assert!(config.bins_path().is_file());
        assert_eq!(catalog.items().store().path(), config.items_path());
    }
}
