use binstock_core::{DomainError, Entity, EntityId, ItemId};
use binstock_inventory::{Item, NewItem};

use super::CatalogResult;
use crate::store::{EntityStore, Mutation};

/// CRUD over catalog items, backed by one dedicated store.
#[derive(Debug)]
pub struct ItemCatalog<S> {
    store: S,
}

impl<S> ItemCatalog<S>
where
    S: EntityStore<Item>,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn get(&self, id: ItemId) -> CatalogResult<Item> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found().into())
    }

    /// All items, ordered by id.
    pub async fn list(&self) -> CatalogResult<Vec<Item>> {
        let mut items = self.store.read_all().await?;
        items.sort_by_key(Item::id_typed);
        Ok(items)
    }

    /// Store a new item, allocating `max + 1` when no id is supplied.
    pub async fn create(&self, new_item: NewItem) -> CatalogResult<(ItemId, Item)> {
        let item = self
            .store
            .modify(move |items: &mut Vec<Item>| -> CatalogResult<Mutation<Item>> {
                let id = match new_item.id {
                    Some(id) if items.iter().any(|i| i.id_typed() == id) => {
                        return Err(DomainError::conflict(format!("item {id} already exists")).into());
                    }
                    Some(id) => id,
                    None => ItemId::next_after(items.iter().map(|i| i.id())).ok_or_else(|| {
                        DomainError::invalid_operation("no item ids left to allocate")
                    })?,
                };
                let item = new_item.into_item(id);
                items.push(item.clone());
                Ok(Mutation::Commit(item))
            })
            .await?;

        tracing::info!(item_id = %item.id_typed(), "item created");
        Ok((item.id_typed(), item))
    }

    /// Replace the description of an existing item. Absent items are never
    /// created.
    pub async fn update(&self, id: ItemId, description: impl Into<String>) -> CatalogResult<Item> {
        let description = description.into();
        let item = self
            .store
            .modify(move |items: &mut Vec<Item>| -> CatalogResult<Mutation<Item>> {
                let item = items
                    .iter_mut()
                    .find(|i| i.id_typed() == id)
                    .ok_or(DomainError::NotFound)?;
                item.set_description(description);
                Ok(Mutation::Commit(item.clone()))
            })
            .await?;

        tracing::info!(item_id = %id, "item updated");
        Ok(item)
    }

    /// Remove an item and return it.
    pub async fn delete(&self, id: ItemId) -> CatalogResult<Item> {
        let removed = self.store.delete(id).await?.ok_or(DomainError::NotFound)?;
        tracing::info!(item_id = %id, "item deleted");
        Ok(removed)
    }
}
