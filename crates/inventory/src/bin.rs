use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use binstock_core::{BinId, DomainError, DomainResult, Entity, ItemId};

/// On-hand amount of one item in one bin.
///
/// Unsigned, so a persisted ledger can never hold a negative value.
pub type Quantity = u64;

/// Aggregate: Bin.
///
/// A bin owns a ledger mapping tracked item identifiers to on-hand quantities.
/// An item that is absent from the ledger is *not tracked*, which is distinct
/// from being tracked with a quantity of zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bin {
    id: BinId,
    description: String,
    #[serde(default)]
    items: BTreeMap<ItemId, Quantity>,
}

impl Bin {
    /// A new bin with an empty ledger.
    pub fn new(id: BinId, description: impl Into<String>) -> Self {
        Self {
            id,
            description: description.into(),
            items: BTreeMap::new(),
        }
    }

    pub fn id_typed(&self) -> BinId {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn items(&self) -> &BTreeMap<ItemId, Quantity> {
        &self.items
    }

    pub fn tracks(&self, item_id: ItemId) -> bool {
        self.items.contains_key(&item_id)
    }

    /// Quantity of a tracked item, `None` when untracked.
    pub fn quantity(&self, item_id: ItemId) -> Option<Quantity> {
        self.items.get(&item_id).copied()
    }

    /// Start tracking `item_id` with a quantity of zero.
    ///
    /// Returns `false` (and leaves the ledger alone) when the item is
    /// already tracked.
    pub fn track(&mut self, item_id: ItemId) -> bool {
        if self.items.contains_key(&item_id) {
            return false;
        }
        self.items.insert(item_id, 0);
        true
    }

    /// Apply `delta` to a tracked item's quantity and return the new quantity.
    ///
    /// Fails with `Conflict` when the item is not tracked and with
    /// `InvalidOperation` when the result would be negative (or overflow).
    /// The ledger is untouched on failure.
    pub fn adjust_quantity(&mut self, item_id: ItemId, delta: i64) -> DomainResult<Quantity> {
        let bin_id = self.id;
        let current = self
            .items
            .get_mut(&item_id)
            .ok_or_else(|| untracked(bin_id, item_id))?;

        let on_hand = *current;
        let next = on_hand.checked_add_signed(delta).ok_or_else(|| {
            if delta < 0 {
                DomainError::invalid_operation(format!(
                    "quantity of item {item_id} in bin {bin_id} cannot go negative ({on_hand} {delta:+})"
                ))
            } else {
                DomainError::invalid_operation(format!(
                    "quantity of item {item_id} in bin {bin_id} overflows ({on_hand} {delta:+})"
                ))
            }
        })?;

        *current = next;
        Ok(next)
    }

    /// Stop tracking `item_id`, whatever its quantity. Returns the quantity
    /// that was on hand.
    pub fn untrack(&mut self, item_id: ItemId) -> DomainResult<Quantity> {
        self.items
            .remove(&item_id)
            .ok_or_else(|| untracked(self.id, item_id))
    }
}

fn untracked(bin_id: BinId, item_id: ItemId) -> DomainError {
    DomainError::conflict(format!("item {item_id} is not tracked in bin {bin_id}"))
}

impl Entity for Bin {
    type Id = BinId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
