//! Entity trait: identity + continuity across state changes.

use crate::id::EntityId;

/// Entity marker + minimal interface.
///
/// Stores key whole collections by [`Entity::id`]; two records with the same
/// identifier are the same entity regardless of their other fields.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: EntityId;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
