//! Typed shape of a structured product filter.
//!
//! A [`StructuredFilter`] is what the language model is asked to produce.
//! Every field is optional; an absent (or `null`) field means "no constraint
//! on that field". Unknown keys are ignored at every level so that extra
//! fields the model invents do not break the request.
//!
//! ```json
//! {
//!   "name": {"contains": ["iphone"]},
//!   "description": {"contains": ["refurbished"]},
//!   "quantity": {"gt": 0},
//!   "price": {"lt": 500, "gt": 100}
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::FilterError;

/// Filter criteria for the four searchable product fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<TextFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<TextFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<NumericFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<NumericFilter>,
}

/// Match if any term is a case-insensitive substring of the field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contains: Option<Vec<String>>,
}

/// Strict numeric bounds. Either, both, or neither may be present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NumericFilter {
    #[serde(default, alias = "lessThan", skip_serializing_if = "Option::is_none")]
    pub lt: Option<f64>,
    #[serde(default, alias = "greaterThan", skip_serializing_if = "Option::is_none")]
    pub gt: Option<f64>,
}

impl StructuredFilter {
    /// Validate sanitized model output against the filter schema.
    ///
    /// Types are never coerced: `{"price": {"lt": "500"}}` is rejected.
    pub fn from_json(map: Map<String, Value>) -> Result<Self, FilterError> {
        serde_json::from_value(Value::Object(map))
            .map_err(|e| FilterError::SchemaValidationFailed(e.to_string()))
    }

    /// True when no field carries an effective constraint.
    pub fn is_empty(&self) -> bool {
        self.name.as_ref().map_or(true, TextFilter::is_empty)
            && self.description.as_ref().map_or(true, TextFilter::is_empty)
            && self.quantity.as_ref().map_or(true, NumericFilter::is_empty)
            && self.price.as_ref().map_or(true, NumericFilter::is_empty)
    }
}

impl TextFilter {
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            contains: Some(terms.into_iter().map(Into::into).collect()),
        }
    }

    /// Terms to match, or an empty slice.
    pub fn terms(&self) -> &[String] {
        self.contains.as_deref().unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.terms().is_empty()
    }
}

impl NumericFilter {
    pub fn is_empty(&self) -> bool {
        self.lt.is_none() && self.gt.is_none()
    }
}
