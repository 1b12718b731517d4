//! Natural-language product search.
//!
//! Orchestrates the full pipeline for one query:
//!
//! 1. [`FilterTranslator::translate`] turns the text into a [`StructuredFilter`](crate::filter::StructuredFilter).
//! 2. [`compile`] turns the filter into a [`Predicate`](crate::predicate::Predicate).
//! 3. [`ProductStore::get_with_filters`] runs it.
//! 4. The matches are returned as a [`ProductList`].
//!
//! The operation is all-or-nothing. A failed translation fails the search;
//! there is no fallback to returning every product.
//!
//! Used by both the `ptrack search` CLI command and `POST /product-search`.

use std::sync::Arc;

use anyhow::Result;
use thiserror::Error;
use tracing::info;

use crate::config::Config;
use crate::db;
use crate::error::TranslationFailed;
use crate::llm;
use crate::models::ProductList;
use crate::predicate::compile;
use crate::store::{ProductStore, SqliteStore};
use crate::translate::FilterTranslator;

/// Why a search could not produce results.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Translation(#[from] TranslationFailed),

    #[error("store error: {0:#}")]
    Store(anyhow::Error),
}

/// Run a natural-language search against `store`.
pub async fn search_products(
    translator: &FilterTranslator,
    store: &dyn ProductStore,
    user_query: &str,
) -> Result<ProductList, SearchError> {
    let filter = translator.translate(user_query).await?;
    let predicate = compile(&filter);

    let products = store
        .get_with_filters(&predicate)
        .await
        .map_err(SearchError::Store)?;

    info!(
        query = user_query,
        matches = products.len(),
        match_all = predicate.is_match_all(),
        "product search"
    );

    Ok(ProductList::from(products))
}

/// CLI entry point: runs a search and prints the matches to stdout.
pub async fn run_search(config: &Config, user_query: &str) -> Result<()> {
    if user_query.trim().is_empty() {
        anyhow::bail!("query must not be empty");
    }

    let model = llm::create_model(&config.llm)?;
    let translator = FilterTranslator::new(Arc::from(model));

    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool.clone());

    let result = search_products(&translator, &store, user_query).await;
    pool.close().await;
    let list = result?;

    if list.count == 0 {
        println!("No results.");
        return Ok(());
    }

    for (i, p) in list.products.iter().enumerate() {
        println!(
            "{}. {}  price={:.2}  qty={}",
            i + 1,
            p.name,
            p.price,
            p.quantity
        );
        println!("    id: {}", p.id);
        if !p.description.is_empty() {
            println!("    {}", p.description);
        }
    }
    println!("{} product(s)", list.count);

    Ok(())
}

/// CLI entry point: prints the filter a query translates to, as JSON.
pub async fn run_translate(config: &Config, user_query: &str) -> Result<()> {
    let model = llm::create_model(&config.llm)?;
    let translator = FilterTranslator::new(Arc::from(model));

    let translation = translator.translate_verbose(user_query).await?;

    println!("--- Raw ---");
    println!("{}", translation.raw);
    println!();
    println!("--- Filter ---");
    println!("{}", serde_json::to_string_pretty(&translation.filter)?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FilterError, ModelInvocationError};
    use crate::models::Product;
    use crate::store::InMemoryStore;
    use crate::translate::testing::ScriptedModel;

    fn phone(id: &str, name: &str, price: f64) -> Product {
        Product {
            id: id.to_string(),
            name: name.to_string(),
            description: "Smartphone".to_string(),
            price,
            quantity: 5,
        }
    }

    fn phones() -> InMemoryStore {
        InMemoryStore::with_products(vec![
            phone("1", "iPhone 12", 450.0),
            phone("2", "iPhone 15", 999.0),
        ])
    }

    fn translator(reply: &str) -> FilterTranslator {
        FilterTranslator::new(Arc::new(ScriptedModel::replying(reply)))
    }

    #[tokio::test]
    async fn test_end_to_end_iphone_under_500() {
        let t = translator(r#"{"name":{"contains":["iphone"]},"price":{"lt":500}}"#);
        let list = search_products(&t, &phones(), "iphone under 500").await.unwrap();
        assert_eq!(list.count, 1);
        assert_eq!(list.products[0].name, "iPhone 12");
    }

    #[tokio::test]
    async fn test_price_bound_excludes_equal() {
        let store = InMemoryStore::with_products(vec![phone("1", "Exactly", 500.0)]);
        let t = translator(r#"{"price":{"lt":500}}"#);
        let list = search_products(&t, &store, "under 500").await.unwrap();
        assert_eq!(list.count, 0);
        assert!(list.products.is_empty());
    }

    #[tokio::test]
    async fn test_empty_filter_returns_everything() {
        let t = translator("{}");
        let list = search_products(&t, &phones(), "show me everything").await.unwrap();
        assert_eq!(list.count, 2);
    }

    #[tokio::test]
    async fn test_translation_failure_fails_search() {
        let t = translator("no json here");
        let err = search_products(&t, &phones(), "???").await.unwrap_err();
        match err {
            SearchError::Translation(tf) => {
                assert!(matches!(tf.source, FilterError::MalformedResponse(_)))
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_model_outage_fails_search() {
        let t = FilterTranslator::new(Arc::new(ScriptedModel::failing(|| {
            ModelInvocationError::Status {
                status: 502,
                body: "bad gateway".to_string(),
            }
        })));
        let err = search_products(&t, &phones(), "iphone").await.unwrap_err();
        assert!(err.to_string().contains("bad gateway"));
    }
}
