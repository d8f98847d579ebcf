//! Strongly-typed identifiers used across the domain.
//!
//! Identifiers are small positive integers. They serialize as bare JSON
//! numbers, and as strings when used as JSON object keys (bin ledgers).

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Behaviour shared by all entity identifiers.
pub trait EntityId:
    Copy + Eq + Ord + core::hash::Hash + core::fmt::Debug + core::fmt::Display + Send + Sync
{
    /// The identifier handed out when a collection is empty.
    fn first() -> Self;

    /// The identifier following `self` in allocation order, or `None` once
    /// the id space is exhausted.
    fn next(&self) -> Option<Self>;

    /// Next free identifier given the identifiers already in use. `None` when
    /// the highest id in use is the largest representable one.
    fn next_after<'a, I>(existing: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Self>,
        Self: 'a,
    {
        match existing.into_iter().max() {
            Some(max) => max.next(),
            None => Some(Self::first()),
        }
    }
}

/// Identifier of a catalog item.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(u32);

/// Identifier of a bin.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BinId(u32);

macro_rules! impl_int_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            pub const fn new(value: u32) -> Self {
                Self(value)
            }

            pub const fn get(self) -> u32 {
                self.0
            }
        }

        impl EntityId for $t {
            fn first() -> Self {
                Self(1)
            }

            fn next(&self) -> Option<Self> {
                self.0.checked_add(1).map(Self)
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<u32> for $t {
            fn from(value: u32) -> Self {
                Self(value)
            }
        }

        impl From<$t> for u32 {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value = u32::from_str(s.trim())
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(value))
            }
        }
    };
}

impl_int_newtype!(ItemId, "ItemId");
impl_int_newtype!(BinId, "BinId");
