//! Whitelist/blacklist handling.
//!
//! Entries address either a relation (`users`) or a column (`users.email`,
//! or `*.email` for every relation). Relation enumeration only looks at
//! bare entries; column introspection only looks at qualified ones.

use crate::placeholders;

/// Bare entries of a filter list: the relation names.
pub fn tables_from_list<S: AsRef<str>>(list: &[S]) -> Vec<&str> {
    list.iter()
        .map(|s| s.as_ref())
        .filter(|s| !s.contains('.'))
        .collect()
}

/// Column names addressed to `table` (or to `*`) in a filter list.
pub fn columns_from_list<'a, S: AsRef<str>>(list: &'a [S], table: &str) -> Vec<&'a str> {
    list.iter()
        .filter_map(|s| {
            let mut parts = s.as_ref().split('.');
            let (owner, column) = (parts.next()?, parts.next()?);
            if parts.next().is_some() {
                return None;
            }
            (owner == table || owner == "*").then_some(column)
        })
        .collect()
}

/// A membership restriction derived from a whitelist and a blacklist.
///
/// A non-empty whitelist always wins, even when none of its entries apply
/// at the current level; the blacklist is only consulted when the whitelist
/// is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListFilter<'a> {
    /// No restriction
    All,
    /// Keep only these names
    Only(Vec<&'a str>),
    /// Drop these names
    Except(Vec<&'a str>),
}

impl<'a> ListFilter<'a> {
    /// Filter for relation names.
    pub fn tables<S: AsRef<str>>(whitelist: &'a [S], blacklist: &'a [S]) -> Self {
        Self::build(whitelist, blacklist, tables_from_list)
    }

    /// Filter for the columns of `table`.
    pub fn columns<S: AsRef<str>>(whitelist: &'a [S], blacklist: &'a [S], table: &str) -> Self {
        Self::build(whitelist, blacklist, |list| columns_from_list(list, table))
    }

    fn build<S: AsRef<str>>(
        whitelist: &'a [S],
        blacklist: &'a [S],
        pick: impl Fn(&'a [S]) -> Vec<&'a str>,
    ) -> Self {
        if !whitelist.is_empty() {
            let names = pick(whitelist);
            if names.is_empty() {
                Self::All
            } else {
                Self::Only(names)
            }
        } else if !blacklist.is_empty() {
            let names = pick(blacklist);
            if names.is_empty() {
                Self::All
            } else {
                Self::Except(names)
            }
        } else {
            Self::All
        }
    }

    /// Names to bind, in placeholder order.
    pub fn params(&self) -> &[&'a str] {
        match self {
            Self::All => &[],
            Self::Only(names) | Self::Except(names) => names.as_slice(),
        }
    }

    /// The ` AND <column> [NOT] IN (...)` clause, numbering placeholders from
    /// `$start`. Empty when there is no restriction.
    pub fn clause(&self, column: &str, start: usize) -> String {
        match self {
            Self::All => String::new(),
            Self::Only(names) => {
                format!(" AND {column} IN ({})", placeholders(names.len(), start))
            }
            Self::Except(names) => {
                format!(" AND {column} NOT IN ({})", placeholders(names.len(), start))
            }
        }
    }
}
