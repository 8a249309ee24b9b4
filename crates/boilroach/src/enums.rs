//! Loading user-defined enum types.
//!
//! `SHOW ENUMS` has changed shape across CockroachDB releases: older
//! servers return `(schema, name, values)`, newer ones append the owner.
//! The values column is either a real text array, an array literal
//! (`{a,b}`), or on the oldest releases a `|`-joined string. Servers that
//! predate enums altogether reject the statement, which we treat as an
//! empty catalog.

use crate::query::Value;
use crate::{Connection, Error, Result};
use boilroach_db_schema::{EnumCatalog, EnumType};

const SHOW_ENUMS: &str = "SHOW ENUMS";

/// Server message for releases without enum support.
const ENUMS_UNSUPPORTED: &str = r#"unrecognized configuration parameter "enums""#;

/// Load the enum types defined in `schema`.
pub async fn enum_types<C: Connection + ?Sized>(conn: &C, schema: &str) -> Result<EnumCatalog> {
    let rows = match conn.query(SHOW_ENUMS, &[]).await {
        Ok(rows) => rows,
        Err(err) if err.message().contains(ENUMS_UNSUPPORTED) => {
            tracing::debug!("server has no enum support");
            return Ok(EnumCatalog::new());
        }
        Err(err) => return Err(err),
    };

    let mut catalog = EnumCatalog::new();
    for row in rows {
        if !matches!(row.len(), 3 | 4) {
            return Err(Error::EnumRowShape(row.len()));
        }
        if row.text(0)? != schema {
            continue;
        }
        let name = row.text(1)?;
        let values = match row.get(2)? {
            Value::Null => Vec::new(),
            Value::Text(raw) => parse_enum_values(raw)?,
            Value::TextArray(values) => values.clone(),
            other => {
                return Err(Error::RowDecode {
                    column: "values".to_string(),
                    expected: "text",
                    actual: other.kind(),
                });
            }
        };
        tracing::trace!(%name, values = values.len(), "loaded enum");
        catalog.insert(EnumType::new(name, values));
    }
    Ok(catalog)
}

/// Decode the textual form of an enum's values.
///
/// The `|` form cannot represent labels containing `|`; such labels are
/// split apart.
pub fn parse_enum_values(raw: &str) -> Result<Vec<String>> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    if raw.len() >= 2 && raw.starts_with('{') && raw.ends_with('}') {
        return parse_array_literal(raw);
    }
    Ok(raw.split('|').map(str::to_string).collect())
}

/// Parse a one-dimensional text array literal such as `{a,"b c","d\"e"}`.
fn parse_array_literal(literal: &str) -> Result<Vec<String>> {
    let invalid = || Error::EnumValues(literal.to_string());

    let inner = &literal[1..literal.len() - 1];
    if inner.is_empty() {
        return Ok(Vec::new());
    }

    let mut values = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut in_quotes = false;
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                quoted = true;
            }
            '\\' if in_quotes => current.push(chars.next().ok_or_else(invalid)?),
            ',' if !in_quotes => {
                values.push(finish_element(&mut current, quoted).ok_or_else(invalid)?);
                quoted = false;
            }
            '{' | '}' if !in_quotes => return Err(invalid()),
            c => current.push(c),
        }
    }
    if in_quotes {
        return Err(invalid());
    }
    values.push(finish_element(&mut current, quoted).ok_or_else(invalid)?);
    Ok(values)
}

/// Take the accumulated element. An unquoted `NULL` has no label.
fn finish_element(current: &mut String, quoted: bool) -> Option<String> {
    let element = std::mem::take(current);
    if !quoted && element.eq_ignore_ascii_case("null") {
        return None;
    }
    Some(element)
}
