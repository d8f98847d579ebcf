use binstock_core::{BinId, DomainError, DomainResult, Entity, EntityId, ItemId};
use binstock_inventory::{Bin, Quantity};

use super::CatalogResult;
use crate::store::{EntityStore, Mutation};

/// Bins and their ledgers, backed by one dedicated store.
///
/// Every mutating operation runs as a single store composite, so ledger
/// changes are serialized across all bins sharing the store: two racing
/// quantity updates can never both start from the same on-hand value.
#[derive(Debug)]
pub struct BinService<S> {
    store: S,
}

impl<S> BinService<S>
where
    S: EntityStore<Bin>,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn get_bin(&self, bin_id: BinId) -> CatalogResult<Bin> {
        self.store
            .get(bin_id)
            .await?
            .ok_or_else(|| DomainError::not_found().into())
    }

    /// All bins, ordered by id.
    pub async fn list(&self) -> CatalogResult<Vec<Bin>> {
        let mut bins = self.store.read_all().await?;
        bins.sort_by_key(Bin::id_typed);
        Ok(bins)
    }

    /// Create a bin with an empty ledger under the next free id.
    pub async fn create(&self, description: impl Into<String>) -> CatalogResult<(BinId, Bin)> {
        let description = description.into();
        let bin = self
            .store
            .modify(move |bins: &mut Vec<Bin>| -> CatalogResult<Mutation<Bin>> {
                let id = BinId::next_after(bins.iter().map(|b| b.id()))
                    .ok_or_else(|| DomainError::invalid_operation("no bin ids left to allocate"))?;
                let bin = Bin::new(id, description);
                bins.push(bin.clone());
                Ok(Mutation::Commit(bin))
            })
            .await?;

        tracing::info!(bin_id = %bin.id_typed(), "bin created");
        Ok((bin.id_typed(), bin))
    }

    /// Start tracking `item_id` in the bin with quantity 0. Already tracked
    /// items are left as they are and nothing is written.
    pub async fn add_item(&self, bin_id: BinId, item_id: ItemId) -> CatalogResult<Bin> {
        let bin = self.modify_bin(bin_id, move |bin| Ok(bin.track(item_id))).await?;
        tracing::info!(%bin_id, %item_id, "item tracked in bin");
        Ok(bin)
    }

    /// Add `delta` (negative to take away) to a tracked item's quantity.
    ///
    /// - `NotFound` when the bin does not exist.
    /// - `Conflict` when the item is not tracked; call [`Self::add_item`] first.
    /// - `InvalidOperation` when the result would be negative; the ledger is
    ///   left unchanged.
    pub async fn update_item_quantity(
        &self,
        bin_id: BinId,
        item_id: ItemId,
        delta: i64,
    ) -> CatalogResult<Bin> {
        let result = self
            .modify_bin(bin_id, move |bin| bin.adjust_quantity(item_id, delta).map(|_| true))
            .await;

        match &result {
            Ok(bin) => tracing::info!(
                %bin_id,
                %item_id,
                delta,
                quantity = bin.quantity(item_id).unwrap_or_default(),
                "bin quantity adjusted"
            ),
            Err(e) => tracing::debug!(%bin_id, %item_id, delta, error = %e, "bin quantity adjustment rejected"),
        }
        result
    }

    /// Stop tracking `item_id`, whatever its quantity.
    ///
    /// A missing bin is `NotFound`; a bin that does not track the item is
    /// `Conflict`, so callers can tell the two apart.
    pub async fn remove_item(&self, bin_id: BinId, item_id: ItemId) -> CatalogResult<Bin> {
        let bin = self
            .modify_bin(bin_id, move |bin| bin.untrack(item_id).map(|_| true))
            .await?;
        tracing::info!(%bin_id, %item_id, "item removed from bin");
        Ok(bin)
    }

    /// On-hand quantity of a tracked item.
    pub async fn quantity_in_bin(&self, bin_id: BinId, item_id: ItemId) -> CatalogResult<Quantity> {
        let bin = self.get_bin(bin_id).await?;
        bin.quantity(item_id).ok_or_else(|| {
            DomainError::conflict(format!("item {item_id} is not tracked in bin {bin_id}")).into()
        })
    }

    /// Bins whose ledger tracks `item_id`, ordered by id.
    pub async fn bins_tracking(&self, item_id: ItemId) -> CatalogResult<Vec<Bin>> {
        let mut bins = self.list().await?;
        bins.retain(|b| b.tracks(item_id));
        Ok(bins)
    }

    /// Drop `item_id` from every ledger in one composite. Returns how many
    /// bins were touched.
    pub async fn untrack_everywhere(&self, item_id: ItemId) -> CatalogResult<usize> {
        let touched = self
            .store
            .modify(move |bins: &mut Vec<Bin>| -> CatalogResult<Mutation<usize>> {
                let touched = bins
                    .iter_mut()
                    .filter_map(|b| b.untrack(item_id).ok())
                    .count();
                Ok(if touched > 0 {
                    Mutation::Commit(touched)
                } else {
                    Mutation::Unchanged(0)
                })
            })
            .await?;

        if touched > 0 {
            tracing::info!(%item_id, bins = touched, "item untracked from bins");
        }
        Ok(touched)
    }

    /// Run `f` against one bin inside a single composite. `f` returns whether
    /// it changed the bin; unchanged bins are not written back.
    async fn modify_bin<F>(&self, bin_id: BinId, f: F) -> CatalogResult<Bin>
    where
        F: FnOnce(&mut Bin) -> DomainResult<bool> + Send,
    {
        self.store
            .modify(move |bins: &mut Vec<Bin>| -> CatalogResult<Mutation<Bin>> {
                let bin = bins
                    .iter_mut()
                    .find(|b| b.id_typed() == bin_id)
                    .ok_or(DomainError::NotFound)?;
                let changed = f(bin)?;
                let snapshot = bin.clone();
                Ok(if changed {
                    Mutation::Commit(snapshot)
                } else {
                    Mutation::Unchanged(snapshot)
                })
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use std::collections::BTreeMap;

    fn service() -> BinService<InMemoryStore<Bin>> {
        BinService::new(InMemoryStore::new())
    }

    const BOLT: ItemId = ItemId::new(42);

    fn ledger(entries: &[(u32, Quantity)]) -> BTreeMap<ItemId, Quantity> {
        entries.iter().map(|(id, q)| (ItemId::new(*id), *q)).collect()
    }

    #[tokio::test]
    async fn bolts_walkthrough() {
        let bins = service();

        let (id, bin) = bins.create("bolts").await.unwrap();
        assert_eq!(id, BinId::new(1));
        assert_eq!(bin, Bin::new(BinId::new(1), "bolts"));

        let bin = bins.add_item(id, BOLT).await.unwrap();
        assert_eq!(bin.items(), &ledger(&[(42, 0)]));

        let bin = bins.update_item_quantity(id, BOLT, 5).await.unwrap();
        assert_eq!(bin.items(), &ledger(&[(42, 5)]));

        let err = bins.update_item_quantity(id, BOLT, -10).await.unwrap_err();
        assert!(err.is_invalid_operation());
        assert_eq!(bins.get_bin(id).await.unwrap().items(), &ledger(&[(42, 5)]));

        let bin = bins.remove_item(id, BOLT).await.unwrap();
        assert!(bin.items().is_empty());
    }

    #[tokio::test]
    async fn missing_bin_is_not_found_for_every_operation() {
        let bins = service();
        let ghost = BinId::new(9);

        assert!(bins.get_bin(ghost).await.unwrap_err().is_not_found());
        assert!(bins.add_item(ghost, BOLT).await.unwrap_err().is_not_found());
        assert!(bins.update_item_quantity(ghost, BOLT, 1).await.unwrap_err().is_not_found());
        assert!(bins.remove_item(ghost, BOLT).await.unwrap_err().is_not_found());
        assert!(bins.quantity_in_bin(ghost, BOLT).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn untracked_item_is_conflict_and_ledger_is_untouched() {
        let bins = service();
        let (id, _) = bins.create("bolts").await.unwrap();

        assert!(bins.update_item_quantity(id, BOLT, 3).await.unwrap_err().is_conflict());
        assert!(bins.remove_item(id, BOLT).await.unwrap_err().is_conflict());
        assert!(bins.quantity_in_bin(id, BOLT).await.unwrap_err().is_conflict());
        assert!(bins.get_bin(id).await.unwrap().items().is_empty());
    }

    #[tokio::test]
    async fn add_item_twice_keeps_quantity() {
        let bins = service();
        let (id, _) = bins.create("bolts").await.unwrap();
        bins.add_item(id, BOLT).await.unwrap();
        bins.update_item_quantity(id, BOLT, 12).await.unwrap();

        let bin = bins.add_item(id, BOLT).await.unwrap();
        assert_eq!(bin.quantity(BOLT), Some(12));
        assert_eq!(bins.quantity_in_bin(id, BOLT).await.unwrap(), 12);
    }

    #[tokio::test]
    async fn bin_ids_are_allocated_in_order() {
        let bins = service();
        let (a, _) = bins.create("a").await.unwrap();
        let (b, _) = bins.create("b").await.unwrap();
        assert_eq!((a.get(), b.get()), (1, 2));

        let listed: Vec<_> = bins.list().await.unwrap().iter().map(|b| b.description().to_string()).collect();
        assert_eq!(listed, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn create_after_max_bin_id_is_rejected() {
        let bins = BinService::new(InMemoryStore::with_entities(vec![Bin::new(BinId::new(u32::MAX), "last")]));

        assert!(bins.create("overflow").await.unwrap_err().is_invalid_operation());
        assert_eq!(bins.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn untrack_everywhere_touches_only_tracking_bins() {
        let bins = service();
        let (a, _) = bins.create("a").await.unwrap();
        let (b, _) = bins.create("b").await.unwrap();
        let (c, _) = bins.create("c").await.unwrap();
        bins.add_item(a, BOLT).await.unwrap();
        bins.add_item(c, BOLT).await.unwrap();
        bins.add_item(b, ItemId::new(7)).await.unwrap();

        let tracking: Vec<_> = bins.bins_tracking(BOLT).await.unwrap().iter().map(|b| b.id_typed()).collect();
        assert_eq!(tracking, vec![a, c]);

        assert_eq!(bins.untrack_everywhere(BOLT).await.unwrap(), 2);
        assert!(bins.bins_tracking(BOLT).await.unwrap().is_empty());
        assert_eq!(bins.get_bin(b).await.unwrap().items(), &ledger(&[(7, 0)]));
        assert_eq!(bins.untrack_everywhere(BOLT).await.unwrap(), 0);
    }
}
