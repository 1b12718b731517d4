//! CLI product commands: `list`, `get`, `add`, `delete`.
//!
//! Each command opens the configured database, runs one store operation,
//! prints the outcome to stdout, and closes the pool.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::db;
use crate::models::{Product, ProductCreate};
use crate::store::{ProductStore, SqliteStore};

pub async fn run_list(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool.clone());
    let products = store.get_all().await;
    pool.close().await;
    let products = products?;

    if products.is_empty() {
        println!("No products.");
        return Ok(());
    }

    for p in &products {
        print_row(p);
    }
    println!("{} product(s)", products.len());
    Ok(())
}

pub async fn run_get(config: &Config, id: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool.clone());
    let product = store.get_by_id(id).await;
    pool.close().await;

    match product? {
        Some(p) => {
            println!("--- Product ---");
            println!("id:          {}", p.id);
            println!("name:        {}", p.name);
            println!("price:       {:.2}", p.price);
            println!("quantity:    {}", p.quantity);
            println!("description: {}", p.description);
            Ok(())
        }
        None => bail!("product not found: {}", id),
    }
}

pub async fn run_add(config: &Config, data: ProductCreate) -> Result<()> {
    data.validate()?;

    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool.clone());
    let created = store.create(data).await;
    pool.close().await;
    let created = created?;

    println!("created {}", created.id);
    Ok(())
}

pub async fn run_delete(config: &Config, id: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool.clone());
    let deleted = store.delete(id).await;
    pool.close().await;

    if !deleted? {
        bail!("product not found: {}", id);
    }
    println!("deleted {}", id);
    Ok(())
}

fn print_row(p: &Product) {
    println!("{}  {:<24} price={:>9.2}  qty={}", p.id, p.name, p.price, p.quantity);
}
