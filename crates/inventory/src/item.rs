use serde::{Deserialize, Serialize};

use binstock_core::{Entity, ItemId};

/// A catalog item that can be stored in bins.
///
/// Items carry no quantity; on-hand amounts live in bin ledgers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    id: ItemId,
    description: String,
}

impl Item {
    pub fn new(id: ItemId, description: impl Into<String>) -> Self {
        Self {
            id,
            description: description.into(),
        }
    }

    pub fn id_typed(&self) -> ItemId {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Replace the description. The identifier is never mutable.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }
}

impl Entity for Item {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Data for an item that does not exist yet.
///
/// When `id` is `None` the catalog allocates the next free identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    #[serde(default)]
    pub id: Option<ItemId>,
    pub description: String,
}

impl NewItem {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            id: None,
            description: description.into(),
        }
    }

    pub fn with_id(id: ItemId, description: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            description: description.into(),
        }
    }

    /// Materialize the item under `id`.
    pub fn into_item(self, id: ItemId) -> Item {
        Item::new(id, self.description)
    }
}
