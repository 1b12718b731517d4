//! Compilation of a [`StructuredFilter`] into a store predicate.
//!
//! Semantics:
//!
//! | Filter field | Predicate |
//! |--------------|-----------|
//! | `name.contains` | OR of case-insensitive substring tests on `name` |
//! | `description.contains` | OR of case-insensitive substring tests on `description` |
//! | `quantity.lt` / `quantity.gt` | `quantity < lt` AND `quantity > gt` |
//! | `price.lt` / `price.gt` | `price < lt` AND `price > gt` |
//!
//! Fields combine with AND. Absent fields, empty term lists, and numeric
//! objects without bounds add no clause, so `{}` matches every product.
//! Bounds are strict: `price.lt = 500` excludes a product priced at 500.

use crate::filter::{NumericFilter, StructuredFilter, TextFilter};
use crate::models::Product;

/// Store-level filter produced by [`compile`].
///
/// Stores evaluate it with [`Predicate::matches`]. The SQLite store first
/// narrows rows by the SQL rendering of the numeric bounds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    clauses: Vec<Clause>,
}

#[derive(Debug, Clone, PartialEq)]
enum Clause {
    /// Any of the lowercased terms occurs in the field.
    AnyContains { field: TextField, terms: Vec<String> },
    LessThan { field: NumericField, bound: f64 },
    GreaterThan { field: NumericField, bound: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextField {
    Name,
    Description,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumericField {
    Quantity,
    Price,
}

impl TextField {
    fn value(self, product: &Product) -> &str {
        match self {
            TextField::Name => &product.name,
            TextField::Description => &product.description,
        }
    }
}

impl NumericField {
    fn column(self) -> &'static str {
        match self {
            NumericField::Quantity => "quantity",
            NumericField::Price => "price",
        }
    }

    fn value(self, product: &Product) -> f64 {
        match self {
            NumericField::Quantity => product.quantity as f64,
            NumericField::Price => product.price,
        }
    }
}

/// Compile a filter into a predicate. Never fails.
pub fn compile(filter: &StructuredFilter) -> Predicate {
    let mut clauses = Vec::new();

    if let Some(f) = &filter.name {
        push_text(&mut clauses, TextField::Name, f);
    }
    if let Some(f) = &filter.description {
        push_text(&mut clauses, TextField::Description, f);
    }
    if let Some(f) = &filter.quantity {
        push_numeric(&mut clauses, NumericField::Quantity, f);
    }
    if let Some(f) = &filter.price {
        push_numeric(&mut clauses, NumericField::Price, f);
    }

    Predicate { clauses }
}

fn push_text(clauses: &mut Vec<Clause>, field: TextField, filter: &TextFilter) {
    if filter.is_empty() {
        return;
    }
    clauses.push(Clause::AnyContains {
        field,
        terms: filter.terms().iter().map(|t| t.to_lowercase()).collect(),
    });
}

fn push_numeric(clauses: &mut Vec<Clause>, field: NumericField, filter: &NumericFilter) {
    if let Some(bound) = filter.lt {
        clauses.push(Clause::LessThan { field, bound });
    }
    if let Some(bound) = filter.gt {
        clauses.push(Clause::GreaterThan { field, bound });
    }
}

impl Predicate {
    /// A predicate with no clauses matches every product.
    pub fn match_all() -> Self {
        Self::default()
    }

    pub fn is_match_all(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Evaluate the predicate against a single product.
    pub fn matches(&self, product: &Product) -> bool {
        self.clauses.iter().all(|clause| match clause {
            Clause::AnyContains { field, terms } => {
                let haystack = field.value(product).to_lowercase();
                terms.iter().any(|t| haystack.contains(t.as_str()))
            }
            Clause::LessThan { field, bound } => field.value(product) < *bound,
            Clause::GreaterThan { field, bound } => field.value(product) > *bound,
        })
    }

    /// Render the numeric bounds as a SQLite `WHERE` condition with
    /// positional parameters.
    ///
    /// Substring clauses are not rendered. SQLite's `lower()` only folds
    /// ASCII, so stores narrow by the returned condition and then apply
    /// [`matches`](Self::matches) to every row.
    pub(crate) fn to_sql(&self) -> (String, Vec<f64>) {
        let mut parts = Vec::new();
        let mut params = Vec::new();

        for clause in &self.clauses {
            match clause {
                Clause::AnyContains { .. } => {}
                Clause::LessThan { field, bound } => {
                    params.push(*bound);
                    parts.push(format!("{} < ?", field.column()));
                }
                Clause::GreaterThan { field, bound } => {
                    params.push(*bound);
                    parts.push(format!("{} > ?", field.column()));
                }
            }
        }

        if parts.is_empty() {
            return ("1 = 1".to_string(), params);
        }
        (parts.join(" AND "), params)
    }
}
