//! In-memory [`ProductStore`] for tests and embedding.
//!
//! Products live in insertion order in a `Vec` behind `std::sync::RwLock`.
//! Filtered reads evaluate the predicate with [`Predicate::matches`].

use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::models::{Product, ProductCreate, ProductUpdate};
use crate::predicate::Predicate;

use super::{new_product_id, ProductStore};

#[derive(Default)]
pub struct InMemoryStore {
    products: RwLock<Vec<Product>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store holding `products` as-is (ids included).
    pub fn with_products(products: Vec<Product>) -> Self {
        Self {
            products: RwLock::new(products),
        }
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow!("in-memory store lock poisoned")
}

#[async_trait]
impl ProductStore for InMemoryStore {
    async fn get_all(&self) -> Result<Vec<Product>> {
        Ok(self.products.read().map_err(poisoned)?.clone())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Product>> {
        let products = self.products.read().map_err(poisoned)?;
        Ok(products.iter().find(|p| p.id == id).cloned())
    }

    async fn create(&self, data: ProductCreate) -> Result<Product> {
        let product = Product {
            id: new_product_id(),
            name: data.name,
            description: data.description,
            price: data.price,
            quantity: data.quantity,
        };
        self.products
            .write()
            .map_err(poisoned)?
            .push(product.clone());
        Ok(product)
    }

    async fn update(&self, id: &str, data: ProductUpdate) -> Result<Option<Product>> {
        let mut products = self.products.write().map_err(poisoned)?;
        Ok(products.iter_mut().find(|p| p.id == id).map(|p| {
            data.apply_to(p);
            p.clone()
        }))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut products = self.products.write().map_err(poisoned)?;
        let before = products.len();
        products.retain(|p| p.id != id);
        Ok(products.len() != before)
    }

    async fn get_with_filters(&self, predicate: &Predicate) -> Result<Vec<Product>> {
        let products = self.products.read().map_err(poisoned)?;
        Ok(products
            .iter()
            .filter(|p| predicate.matches(p))
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.products.read().map_err(poisoned)?.len() as i64)
    }
}
