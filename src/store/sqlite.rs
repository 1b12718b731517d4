//! SQLite-backed [`ProductStore`].
//!
//! Each operation borrows a connection from the pool for the duration of
//! its statement(s) and returns it on every path, including errors.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::models::{Product, ProductCreate, ProductUpdate};
use crate::predicate::Predicate;

use super::{new_product_id, ProductStore};

const SELECT_COLUMNS: &str = "SELECT id, name, price, description, quantity FROM products";

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_product(row: &SqliteRow) -> Product {
    Product {
        id: row.get("id"),
        name: row.get("name"),
        price: row.get("price"),
        description: row.get("description"),
        quantity: row.get("quantity"),
    }
}

#[async_trait]
impl ProductStore for SqliteStore {
    async fn get_all(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query(&format!("{} ORDER BY rowid ASC", SELECT_COLUMNS))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_product).collect())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Product>> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_product))
    }

    async fn create(&self, data: ProductCreate) -> Result<Product> {
        let product = Product {
            id: new_product_id(),
            name: data.name,
            description: data.description,
            price: data.price,
            quantity: data.quantity,
        };

        sqlx::query(
            "INSERT INTO products (id, name, price, description, quantity) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.price)
        .bind(&product.description)
        .bind(product.quantity)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    async fn update(&self, id: &str, data: ProductUpdate) -> Result<Option<Product>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let mut product = match row {
            Some(row) => row_to_product(&row),
            None => return Ok(None),
        };

        data.apply_to(&mut product);

        sqlx::query(
            "UPDATE products SET name = ?, price = ?, description = ?, quantity = ? WHERE id = ?",
        )
        .bind(&product.name)
        .bind(product.price)
        .bind(&product.description)
        .bind(product.quantity)
        .bind(&product.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(product))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_with_filters(&self, predicate: &Predicate) -> Result<Vec<Product>> {
        // Bounds narrow in SQL; substring terms need Unicode case folding.
        let (condition, bounds) = predicate.to_sql();
        let sql = format!("{} WHERE {} ORDER BY rowid ASC", SELECT_COLUMNS, condition);

        let mut query = sqlx::query(&sql);
        for bound in bounds {
            query = query.bind(bound);
        }

        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows
            .iter()
            .map(row_to_product)
            .filter(|p| predicate.matches(p))
            .collect())
    }

    async fn count(&self) -> Result<i64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }
}
