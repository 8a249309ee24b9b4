//! SQL text helpers for catalog queries.
//!
//! Catalog queries are plain SQL strings with `$n` placeholders. The only
//! dynamic part is the whitelist/blacklist membership test, whose
//! placeholder count depends on the configured lists; [`ListFilter`]
//! renders that clause and hands back the matching parameters.

mod filter;
pub use filter::*;

/// Render `count` numbered placeholders starting at `$start`.
///
/// # Example
/// ```
/// assert_eq!(boilroach_sql::placeholders(3, 2), "$2,$3,$4");
/// assert_eq!(boilroach_sql::placeholders(0, 1), "");
/// ```
pub fn placeholders(count: usize, start: usize) -> String {
    (start..start + count)
        .map(|n| format!("${n}"))
        .collect::<Vec<_>>()
        .join(",")
}
