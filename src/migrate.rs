use anyhow::Result;
use sqlx::SqlitePool;
use tracing::info;

use crate::config::Config;
use crate::db;
use crate::models::ProductCreate;
use crate::store::{ProductStore, SqliteStore};

/// Create the schema and, when `[db].seed` is set, insert sample products
/// into an empty table. Safe to run repeatedly.
pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    create_schema(&pool).await?;

    if config.db.seed {
        let inserted = seed_samples(&pool).await?;
        if inserted > 0 {
            info!(inserted, "seeded sample products");
        }
    }

    pool.close().await;
    Ok(())
}

pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS products (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            price REAL NOT NULL,
            description TEXT NOT NULL,
            quantity INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_products_name ON products(name)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Insert the three sample products if the table is empty.
///
/// Returns how many rows were inserted.
pub async fn seed_samples(pool: &SqlitePool) -> Result<usize> {
    let store = SqliteStore::new(pool.clone());
    if store.count().await? > 0 {
        return Ok(0);
    }

    let samples = sample_products();
    let n = samples.len();
    for sample in samples {
        store.create(sample).await?;
    }
    Ok(n)
}

fn sample_products() -> Vec<ProductCreate> {
    (1..=3)
        .map(|i| ProductCreate {
            name: format!("Product {}", i),
            price: 10.0 * i as f64,
            description: format!("Description {}", i),
            quantity: 10 * i,
        })
        .collect()
}
