//! Classification of catalog type names into [`TypeDescriptor`]s.
//!
//! Input is whatever the column introspector settled on for a column: a
//! base type name (`int8`, `string`, `timestamptz`), the literal `array`
//! plus a separate element type, a `<schema>.<name>` enum reference, or an
//! enum marker (`enum.mood('happy','sad')`).

use crate::ClassifyError;
use boilroach_db_schema::{EnumCatalog, EnumType, TypeDescriptor, TypeKind};
use regex::Regex;
use std::sync::LazyLock;

/// Type string the column introspector uses for array columns.
pub const ARRAY_MARKER: &str = "array";

const ARRAY_SUFFIX: &str = "[]";

static QUALIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^\)]+)\)").expect("qualifier pattern is valid"));

/// Lowercase a raw catalog type and drop every parenthesized qualifier:
/// `DECIMAL(10,2)` becomes `decimal`, `STRING(20)[]` becomes `string[]`.
pub fn normalize_type(raw: &str) -> String {
    QUALIFIER.replace_all(raw, "").trim().to_lowercase()
}

/// The element type of an `<element>[]` type name.
pub fn array_element(db_type: &str) -> Option<&str> {
    db_type
        .strip_suffix(ARRAY_SUFFIX)
        .map(str::trim_end)
        .filter(|element| !element.is_empty())
}

/// Classify a column type.
///
/// `array_type` is consulted when `db_type` is [`ARRAY_MARKER`]; a missing
/// element type there is the one failure this function reports. Types we
/// have no mapping for classify as [`TypeKind::Unknown`] and log a warning.
pub fn classify_type(
    db_type: &str,
    nullable: bool,
    array_type: Option<&str>,
    enums: &EnumCatalog,
    schema: &str,
) -> Result<TypeDescriptor, ClassifyError> {
    let kind = classify_kind(db_type, nullable, array_type, enums, schema)?;
    Ok(TypeDescriptor { kind, nullable })
}

fn classify_kind(
    db_type: &str,
    nullable: bool,
    array_type: Option<&str>,
    enums: &EnumCatalog,
    schema: &str,
) -> Result<TypeKind, ClassifyError> {
    // Markers carry case-sensitive labels, check before normalizing.
    if let Some(enum_type) = EnumType::parse_marker(db_type) {
        return Ok(TypeKind::Enum(enum_type));
    }

    let normalized = normalize_type(db_type);

    if normalized == ARRAY_MARKER {
        let element = array_type
            .filter(|element| !element.is_empty())
            .ok_or_else(|| ClassifyError::MissingArrayElement {
                db_type: db_type.to_string(),
            })?;
        return array_of(element, enums, schema);
    }

    if let Some(element) = array_element(&normalized) {
        return array_of(element, enums, schema);
    }

    if let Some(enum_type) = enums.lookup_qualified(&normalized, schema) {
        return Ok(TypeKind::Enum(enum_type.clone()));
    }

    Ok(base_kind(&normalized).unwrap_or_else(|| {
        tracing::warn!(
            db_type = %normalized,
            nullable,
            fallback = "text",
            "unhandled data type, falling back to text"
        );
        TypeKind::Unknown {
            db_type: normalized.clone(),
        }
    }))
}

fn array_of(element: &str, enums: &EnumCatalog, schema: &str) -> Result<TypeKind, ClassifyError> {
    let element = classify_type(element, false, None, enums, schema)?;
    Ok(TypeKind::Array {
        element: Box::new(element),
    })
}

/// Map a normalized base type name.
fn base_kind(db_type: &str) -> Option<TypeKind> {
    let kind = match db_type {
        "int8" | "bigint" | "bigserial" => TypeKind::Int { bits: 64 },
        "int4" | "int" | "integer" | "serial" => TypeKind::Int { bits: 32 },
        "int2" | "smallint" | "smallserial" => TypeKind::Int { bits: 16 },
        "decimal" | "numeric" => TypeKind::Decimal,
        "float8" | "float" | "double precision" => TypeKind::Float { bits: 64 },
        "float4" | "real" => TypeKind::Float { bits: 32 },
        "string" | "collate" | "bit" | "bit varying" | "varbit" | "character"
        | "character varying" | "char" | "varchar" | "text" => TypeKind::Text,
        "interval" => TypeKind::Interval,
        "inet" => TypeKind::Inet,
        "uuid" => TypeKind::Uuid,
        "\"char\"" => TypeKind::Byte,
        "bytes" | "bytea" => TypeKind::Bytes,
        "json" | "jsonb" => TypeKind::Json,
        "bool" | "boolean" => TypeKind::Bool,
        "date" => TypeKind::Date,
        "time" | "timetz" | "timestamp" | "timestamp without time zone" | "timestamptz"
        | "timestamp with time zone" => TypeKind::Timestamp,
        _ => return None,
    };
    Some(kind)
}
