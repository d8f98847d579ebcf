//! Infrastructure layer: entity stores, catalog services, configuration.

pub mod catalog;
pub mod config;
pub mod services;
pub mod store;


pub use catalog::{Catalog, FileCatalog};
pub use config::{CatalogConfig, ItemDeletePolicy};
pub use services::{BinService, CatalogError, CatalogResult, ItemCatalog};
pub use store::{EntityStore, InMemoryStore, JsonFileStore, Mutation, StoreError, StoreResult};
