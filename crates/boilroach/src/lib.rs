//! CockroachDB schema introspection for code generators.
//!
//! This crate provides:
//! - Enumeration of the tables and views of a schema
//! - Column, primary key and foreign key introspection
//! - Classification of CockroachDB type names into portable type descriptors
//! - View insert/upsert capability detection
//!
//! # Catalog drift
//!
//! CockroachDB's catalog has shifted across releases. Column introspection
//! prefers `crdb_sql_type` and skips hidden columns, retrying with plainer
//! queries when the server says those catalog columns do not exist. Enum
//! loading accepts every historical shape of `SHOW ENUMS` and treats servers
//! without enum support as having no enums.
//!
//! # Usage
//!
//! ```ignore
//! let config = boilroach_config::Config::from_json(&input)?;
//! let info = boilroach::assemble(&config).await?;
//! for table in info.tables() {
//!     println!("{} has {} columns", table.name, table.columns.len());
//! }
//! ```
//!
//! Every operation is also available over any [`Connection`], so a caller
//! holding its own `tokio_postgres::Client` can run single steps:
//!
//! ```ignore
//! let columns = boilroach::columns(&client, "public", "users", &[], &[]).await?;
//! ```

pub mod classify;
mod columns;
mod driver;
mod enums;
mod error;
mod keys;
pub mod query;
mod relations;
mod session;
mod traced;
pub mod translate;
mod views;

#[cfg(test)]
mod fake;

pub use classify::classify_type;
pub use columns::{columns, columns_with_enums};
pub use driver::{assemble, introspect};
pub use enums::{enum_types, parse_enum_values};
pub use error::{ClassifyError, Error, Result};
pub use keys::{foreign_keys, primary_key};
pub use relations::{list_relations, table_names, view_names};
pub use session::Session;
pub use traced::{Connection, ConnectionExt, QueryFuture, TracedConn};
pub use translate::{EnumNaming, host_type, translate_column};
pub use views::{view_capabilities, view_flags};

// Re-export the model so callers need only one dependency
pub use boilroach_db_schema as schema;
