//! Materialized catalog rows.
//!
//! Catalog queries return a handful of text, boolean and integer columns.
//! Rows are decoded eagerly into [`CatalogRow`]s so that nothing borrowed
//! from the driver outlives the call that fetched it.

mod row;
mod value;

pub use row::CatalogRow;
pub use value::Value;
