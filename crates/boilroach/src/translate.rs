//! Mapping classified columns onto the generator's host type names.
//!
//! The names follow the conventions of the generator's runtime support
//! library: plain scalars for non-null columns (`int64`, `time.Time`), the
//! `null.*` wrappers for nullable ones, and `types.*Array` for arrays
//! regardless of nullability.

use boilroach_config::Config;
use boilroach_db_schema::{Column, TypeDescriptor, TypeKind};
use heck::ToUpperCamelCase;

/// How enum columns are named in generated code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumNaming {
    /// Emit a dedicated type per enum instead of plain strings.
    pub add_enum_types: bool,
    /// Prefix for the nullable variant of an enum type.
    pub null_prefix: String,
}

impl Default for EnumNaming {
    fn default() -> Self {
        Self {
            add_enum_types: false,
            null_prefix: boilroach_config::DEFAULT_ENUM_NULL_PREFIX.to_string(),
        }
    }
}

impl From<&Config> for EnumNaming {
    fn from(config: &Config) -> Self {
        Self {
            add_enum_types: config.add_enum_types,
            null_prefix: config.enum_null_prefix.clone(),
        }
    }
}

/// Host type name for a classified type.
pub fn host_type(desc: &TypeDescriptor, naming: &EnumNaming) -> String {
    let nullable = desc.nullable;
    let pick = |plain: &str, null: &str| (if nullable { null } else { plain }).to_string();

    match &desc.kind {
        TypeKind::Int { bits: 64 } => pick("int64", "null.Int64"),
        TypeKind::Int { bits: 16 } => pick("int16", "null.Int16"),
        TypeKind::Int { .. } => pick("int", "null.Int"),
        TypeKind::Float { bits: 32 } => pick("float32", "null.Float32"),
        TypeKind::Float { .. } => pick("float64", "null.Float64"),
        TypeKind::Decimal => pick("types.Decimal", "types.NullDecimal"),
        TypeKind::Bool => pick("bool", "null.Bool"),
        TypeKind::Text
        | TypeKind::Interval
        | TypeKind::Inet
        | TypeKind::Uuid
        | TypeKind::Unknown { .. } => pick("string", "null.String"),
        TypeKind::Byte => pick("types.Byte", "null.Byte"),
        TypeKind::Bytes => pick("[]byte", "null.Bytes"),
        TypeKind::Json => pick("types.JSON", "null.JSON"),
        TypeKind::Timestamp | TypeKind::Date => pick("time.Time", "null.Time"),
        TypeKind::Enum(enum_type) if naming.add_enum_types => {
            let name = enum_type.name.to_upper_camel_case();
            if nullable {
                format!("{}{name}", naming.null_prefix)
            } else {
                name
            }
        }
        TypeKind::Enum(_) => pick("string", "null.String"),
        TypeKind::Array { element } => array_host_type(element).to_string(),
    }
}

fn array_host_type(element: &TypeDescriptor) -> &'static str {
    match &element.kind {
        TypeKind::Int { .. } => "types.Int64Array",
        TypeKind::Bytes => "types.BytesArray",
        TypeKind::Text | TypeKind::Interval | TypeKind::Inet | TypeKind::Uuid | TypeKind::Enum(_) => {
            "types.StringArray"
        }
        TypeKind::Bool => "types.BoolArray",
        TypeKind::Decimal => "types.DecimalArray",
        TypeKind::Float { .. } => "types.Float64Array",
        other => {
            tracing::warn!(
                element = %other,
                fallback = "types.StringArray",
                "unhandled array element type"
            );
            "types.StringArray"
        }
    }
}

/// Fill in the host type of a column.
///
/// Array columns also get their generator-facing type name, the uppercase
/// marker followed by the element type (`ARRAYint8`).
pub fn translate_column(mut column: Column, naming: &EnumNaming) -> Column {
    column.host_type = Some(host_type(&column.type_desc, naming));
    if let Some(element) = column.array_type.as_deref() {
        column.db_type = format!("{}{element}", column.db_type.to_uppercase());
    }
    column
}
