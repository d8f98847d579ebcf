//! Application services over the entity stores.
//!
//! Services translate domain decisions (made by `binstock-inventory` types)
//! into store composites, and report every outcome as a tagged
//! [`CatalogError`] rather than a null result.

pub mod bins;
pub mod items;

pub use bins::BinService;
pub use items::ItemCatalog;

use thiserror::Error;

use binstock_core::DomainError;

use crate::store::StoreError;

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Every failure a catalog operation can report.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Not found, conflict or invalid operation. Never fatal.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Corrupt backing file, I/O failure or lock timeout.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CatalogError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::Domain(DomainError::NotFound))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, CatalogError::Domain(DomainError::Conflict(_)))
    }

    pub fn is_invalid_operation(&self) -> bool {
        matches!(self, CatalogError::Domain(DomainError::InvalidOperation(_)))
    }

    /// HTTP status an adapter should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            CatalogError::Domain(DomainError::NotFound) => 404,
            CatalogError::Domain(DomainError::Conflict(_)) => 409,
            CatalogError::Domain(DomainError::InvalidOperation(_)) => 400,
            CatalogError::Domain(DomainError::InvalidId(_)) => 400,
            CatalogError::Store(StoreError::LockTimeout(_)) => 503,
            CatalogError::Store(_) => 500,
        }
    }
}
