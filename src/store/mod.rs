//! Storage abstraction for products.
//!
//! The [`ProductStore`] trait is everything the HTTP layer and the search
//! orchestration need from persistence. Two implementations ship:
//!
//! - [`SqliteStore`]: the production store, backed by a `sqlx` pool.
//! - [`InMemoryStore`]: a `RwLock`-guarded list for tests and embedding.
//!
//! Implementations must be `Send + Sync` to be shared across request
//! handlers.

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Product, ProductCreate, ProductUpdate};
use crate::predicate::Predicate;

/// Abstract product persistence.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`get_all`](ProductStore::get_all) | Every product |
/// | [`get_by_id`](ProductStore::get_by_id) | One product, if present |
/// | [`create`](ProductStore::create) | Insert with a fresh UUID |
/// | [`update`](ProductStore::update) | Replace present fields, if the product exists |
/// | [`delete`](ProductStore::delete) | Remove; `true` if something was deleted |
/// | [`get_with_filters`](ProductStore::get_with_filters) | Products matching a compiled predicate |
/// | [`count`](ProductStore::count) | Number of stored products |
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn get_all(&self) -> Result<Vec<Product>>;

    async fn get_by_id(&self, id: &str) -> Result<Option<Product>>;

    async fn create(&self, data: ProductCreate) -> Result<Product>;

    async fn update(&self, id: &str, data: ProductUpdate) -> Result<Option<Product>>;

    async fn delete(&self, id: &str) -> Result<bool>;

    async fn get_with_filters(&self, predicate: &Predicate) -> Result<Vec<Product>>;

    async fn count(&self) -> Result<i64>;
}

fn new_product_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
