//! Core data models used throughout Product Tracker.
//!
//! [`Product`] is the stored entity. [`ProductCreate`] and [`ProductUpdate`]
//! are the request shapes for creating and partially updating it, and
//! [`ProductList`] is the response shape for listing and search.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// A product stored in the inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// UUID v4, generated at creation.
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub quantity: i64,
}

/// Request body for creating a product. All fields are required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    pub price: f64,
    pub description: String,
    pub quantity: i64,
}

/// Request body for updating a product. Only present fields are replaced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
}

/// A list of products with its length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductList {
    pub products: Vec<Product>,
    pub count: usize,
}

impl From<Vec<Product>> for ProductList {
    fn from(products: Vec<Product>) -> Self {
        Self {
            count: products.len(),
            products,
        }
    }
}

impl ProductCreate {
    /// Reject negative or non-finite prices and negative quantities.
    pub fn validate(&self) -> Result<()> {
        validate_price(self.price)?;
        validate_quantity(self.quantity)
    }
}

impl ProductUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        if let Some(quantity) = self.quantity {
            validate_quantity(quantity)?;
        }
        Ok(())
    }

    /// Apply the present fields onto `product`.
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(name) = &self.name {
            product.name = name.clone();
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(description) = &self.description {
            product.description = description.clone();
        }
        if let Some(quantity) = self.quantity {
            product.quantity = quantity;
        }
    }
}

fn validate_price(price: f64) -> Result<()> {
    if !price.is_finite() || price < 0.0 {
        bail!("invalid price: must be a non-negative number, got {}", price);
    }
    Ok(())
}

fn validate_quantity(quantity: i64) -> Result<()> {
    if quantity < 0 {
        bail!("invalid quantity: must be non-negative, got {}", quantity);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lamp() -> Product {
        Product {
            id: "1".to_string(),
            name: "Lamp".to_string(),
            description: "Desk lamp".to_string(),
            price: 20.0,
            quantity: 4,
        }
    }

    #[test]
    fn test_update_replaces_only_present_fields() {
        let mut p = lamp();
        let update = ProductUpdate {
            price: Some(25.0),
            ..Default::default()
        };
        update.apply_to(&mut p);
        assert_eq!(p.price, 25.0);
        assert_eq!(p.name, "Lamp");
        assert_eq!(p.quantity, 4);
    }

    #[test]
    fn test_create_rejects_negative_values() {
        let bad_price = ProductCreate {
            name: "x".to_string(),
            price: -1.0,
            description: String::new(),
            quantity: 1,
        };
        assert!(bad_price.validate().unwrap_err().to_string().contains("invalid price"));

        let bad_quantity = ProductCreate {
            price: 1.0,
            quantity: -3,
            ..bad_price
        };
        assert!(bad_quantity
            .validate()
            .unwrap_err()
            .to_string()
            .contains("invalid quantity"));
    }

    #[test]
    fn test_update_validation() {
        assert!(ProductUpdate::default().validate().is_ok());
        let update = ProductUpdate {
            quantity: Some(-1),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_list_count_matches_len() {
        let list = ProductList::from(vec![lamp(), lamp()]);
        assert_eq!(list.count, 2);
    }
}
