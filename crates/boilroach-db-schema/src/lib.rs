//! Database schema types for boilroach.
//!
//! This crate contains the value objects produced by an introspection pass:
//! relations, columns, keys, view capabilities and the canonical
//! [`TypeDescriptor`] each column is classified into. Nothing in here talks
//! to a database; the `boilroach` crate fills these in.

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

// =============================================================================
// Type descriptors
// =============================================================================

/// The portable classification of a column type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeKind {
    /// Signed integer, `bits` is 16, 32 or 64.
    Int { bits: u8 },
    /// Floating point, `bits` is 32 or 64.
    Float { bits: u8 },
    /// Fixed-point decimal (DECIMAL / NUMERIC)
    Decimal,
    /// BOOL
    Bool,
    /// STRING, VARCHAR, CHAR, BIT and friends
    Text,
    /// The single-byte `"char"` type
    Byte,
    /// BYTES / BYTEA
    Bytes,
    /// JSON / JSONB
    Json,
    /// TIMESTAMP, TIMESTAMPTZ and TIME
    Timestamp,
    /// DATE
    Date,
    /// INTERVAL
    Interval,
    /// INET
    Inet,
    /// UUID
    Uuid,
    /// A user-declared enumerated type.
    Enum(EnumType),
    /// An array; the element is always classified as non-nullable.
    Array { element: Box<TypeDescriptor> },
    /// A type we have no mapping for. Consumers treat it as text.
    Unknown { db_type: String },
}

impl TypeKind {
    /// Whether consumers should treat this kind as text.
    pub fn is_text_like(&self) -> bool {
        matches!(
            self,
            TypeKind::Text
                | TypeKind::Interval
                | TypeKind::Inet
                | TypeKind::Uuid
                | TypeKind::Unknown { .. }
        )
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeKind::Int { bits } => write!(f, "int{bits}"),
            TypeKind::Float { bits } => write!(f, "float{bits}"),
            TypeKind::Decimal => write!(f, "decimal"),
            TypeKind::Bool => write!(f, "bool"),
            TypeKind::Text => write!(f, "text"),
            TypeKind::Byte => write!(f, "byte"),
            TypeKind::Bytes => write!(f, "bytes"),
            TypeKind::Json => write!(f, "json"),
            TypeKind::Timestamp => write!(f, "timestamp"),
            TypeKind::Date => write!(f, "date"),
            TypeKind::Interval => write!(f, "interval"),
            TypeKind::Inet => write!(f, "inet"),
            TypeKind::Uuid => write!(f, "uuid"),
            TypeKind::Enum(e) => write!(f, "{e}"),
            TypeKind::Array { element } => write!(f, "array<{element}>"),
            TypeKind::Unknown { db_type } => write!(f, "text /* {db_type} */"),
        }
    }
}

/// A [`TypeKind`] plus whether the column admits NULL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeDescriptor {
    #[serde(flatten)]
    pub kind: TypeKind,
    pub nullable: bool,
}

impl TypeDescriptor {
    /// The non-nullable variant of `kind`.
    pub fn plain(kind: TypeKind) -> Self {
        Self {
            kind,
            nullable: false,
        }
    }

    /// The nullable variant of `kind`.
    pub fn nullable(kind: TypeKind) -> Self {
        Self {
            kind,
            nullable: true,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, TypeKind::Array { .. })
    }

    /// The element descriptor, if this is an array.
    pub fn element(&self) -> Option<&TypeDescriptor> {
        match &self.kind {
            TypeKind::Array { element } => Some(element),
            _ => None,
        }
    }

    /// The enum type, if this is an enum.
    pub fn enum_type(&self) -> Option<&EnumType> {
        match &self.kind {
            TypeKind::Enum(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            write!(f, "null {}", self.kind)
        } else {
            write!(f, "{}", self.kind)
        }
    }
}

// =============================================================================
// Enums
// =============================================================================

/// An enumerated type declared in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumType {
    /// Enum name, without schema
    pub name: String,
    /// Labels in declaration order (empty if declared without values)
    pub values: Vec<String>,
}

impl EnumType {
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// The flat marker string downstream filters recognize enum columns by:
    /// `enum.<name>('v1','v2',...)`.
    pub fn marker(&self) -> String {
        self.to_string()
    }

    /// Recover an enum from its marker string.
    ///
    /// `enum.<name>('')` parses to an enum with no values, which is also how
    /// an enum without values is written out. Labels containing `','` cannot
    /// be recovered.
    pub fn parse_marker(s: &str) -> Option<Self> {
        let rest = s.strip_prefix("enum.")?;
        let open = rest.find('(')?;
        let name = &rest[..open];
        if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return None;
        }

        let inner = rest[open..].strip_prefix("('")?.strip_suffix("')")?;
        let values = if inner.is_empty() {
            Vec::new()
        } else {
            inner.split("','").map(str::to_string).collect()
        };

        Some(Self::new(name, values))
    }
}

impl fmt::Display for EnumType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "enum.{}('{}')", self.name, self.values.join("','"))
    }
}

/// The enums of one schema, keyed by name.
///
/// Loaded once per introspection pass and dropped afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnumCatalog {
    enums: IndexMap<String, EnumType>,
}

impl EnumCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an enum, replacing an earlier one with the same name.
    pub fn insert(&mut self, enum_type: EnumType) {
        self.enums.insert(enum_type.name.clone(), enum_type);
    }

    pub fn get(&self, name: &str) -> Option<&EnumType> {
        self.enums.get(name)
    }

    pub fn len(&self) -> usize {
        self.enums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.enums.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EnumType> {
        self.enums.values()
    }

    /// Resolve a `<schema>.<name>` type string against this catalog.
    ///
    /// Only matches when the qualifier is exactly `schema` and the type has
    /// exactly one dot.
    pub fn lookup_qualified(&self, db_type: &str, schema: &str) -> Option<&EnumType> {
        let (qualifier, name) = db_type.split_once('.')?;
        if qualifier != schema || name.contains('.') {
            return None;
        }
        self.get(name)
    }
}

impl FromIterator<EnumType> for EnumCatalog {
    fn from_iter<I: IntoIterator<Item = EnumType>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for e in iter {
            catalog.insert(e);
        }
        catalog
    }
}

// =============================================================================
// Columns, keys, relations
// =============================================================================

/// Literal default recorded for nullable columns that declare no default.
pub const NULL_DEFAULT: &str = "NULL";

/// A column of a table or view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    /// Column name
    pub name: String,
    /// 1-based position in the relation
    pub ordinal: i64,
    /// Type exactly as the catalog reported it
    pub raw_type: String,
    /// Normalized type: lowercased, qualifiers stripped, `array` for arrays
    /// and the enum marker for enum columns.
    pub db_type: String,
    /// Canonical classification
    #[serde(rename = "type")]
    pub type_desc: TypeDescriptor,
    /// Flat type name for the code generator, set by column translation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_type: Option<String>,
    /// Whether the column allows NULL
    pub nullable: bool,
    /// Whether a single-column unique or primary constraint covers this column
    pub unique: bool,
    /// Default expression, or [`NULL_DEFAULT`] for nullable columns without one
    pub default: Option<String>,
    /// Element type when this is an array column
    #[serde(rename = "arr_type", skip_serializing_if = "Option::is_none")]
    pub array_type: Option<String>,
}

impl Column {
    pub fn is_array(&self) -> bool {
        self.type_desc.is_array()
    }
}

/// A primary key constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrimaryKey {
    /// Constraint name
    pub name: String,
    /// Member columns, in key order
    pub columns: Vec<String>,
}

/// A single-column foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ForeignKey {
    /// Constraint name
    pub name: String,
    /// Owning table
    pub table: String,
    /// Column in the owning table
    pub column: String,
    /// Referenced table
    pub foreign_table: String,
    /// Referenced column
    pub foreign_column: String,
}

/// The five raw facts the catalog reports about a view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewFlags {
    pub insertable: bool,
    pub updatable: bool,
    pub trigger_insertable: bool,
    pub trigger_updatable: bool,
    pub trigger_deletable: bool,
}

impl ViewFlags {
    pub fn capabilities(&self) -> ViewCapabilities {
        ViewCapabilities {
            can_insert: self.insertable || self.trigger_insertable,
            can_upsert: self.insertable && self.updatable,
        }
    }
}

/// What a generator may emit for a view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ViewCapabilities {
    pub can_insert: bool,
    pub can_upsert: bool,
}

/// Whether a relation is a base table or a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Table,
    View,
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationKind::Table => write!(f, "table"),
            RelationKind::View => write!(f, "view"),
        }
    }
}

/// A table or view with everything introspected about it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Relation {
    /// Relation name
    pub name: String,
    /// Table or view
    pub kind: RelationKind,
    /// Columns in ordinal order
    pub columns: Vec<Column>,
    /// Primary key (tables only; `None` when the table has none)
    #[serde(rename = "p_key")]
    pub primary_key: Option<PrimaryKey>,
    /// Foreign keys (tables only)
    #[serde(rename = "f_keys")]
    pub foreign_keys: Vec<ForeignKey>,
    /// Capabilities (views only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_capabilities: Option<ViewCapabilities>,
    /// Set by [`Relation::mark_join_table`] once keys are known
    #[serde(rename = "is_join_table")]
    pub join_table: bool,
}

impl Relation {
    /// An empty relation of the given kind.
    pub fn new(name: impl Into<String>, kind: RelationKind) -> Self {
        Self {
            name: name.into(),
            kind,
            columns: Vec::new(),
            primary_key: None,
            foreign_keys: Vec::new(),
            view_capabilities: None,
            join_table: false,
        }
    }

    pub fn is_view(&self) -> bool {
        self.kind == RelationKind::View
    }

    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// A pure many-to-many link table: two columns, both forming the
    /// primary key, both pointing somewhere else.
    pub fn is_join_table(&self) -> bool {
        let Some(pk) = &self.primary_key else {
            return false;
        };
        if self.columns.len() != 2 || pk.columns.len() != 2 || self.foreign_keys.len() != 2 {
            return false;
        }

        self.columns.iter().all(|col| {
            pk.columns.contains(&col.name) && self.foreign_keys.iter().any(|fk| fk.column == col.name)
        })
    }

    /// Record [`Relation::is_join_table`] in the serialized flag.
    pub fn mark_join_table(&mut self) {
        self.join_table = self.is_join_table();
    }
}

/// Quoting and placeholder conventions the generator should follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dialect {
    #[serde(rename = "lq")]
    pub left_quote: char,
    #[serde(rename = "rq")]
    pub right_quote: char,
    pub use_index_placeholders: bool,
    pub use_schema: bool,
    pub use_default_keyword: bool,
}

impl Dialect {
    /// CockroachDB conventions. `use_schema` is set when targeting a
    /// non-default schema.
    pub fn cockroach(use_schema: bool) -> Self {
        Self {
            left_quote: '"',
            right_quote: '"',
            use_index_placeholders: true,
            use_schema,
            use_default_keyword: true,
        }
    }
}

/// The result of one introspection pass.
#[derive(Debug, Clone, Serialize)]
pub struct DbInfo {
    /// Schema that was introspected
    pub schema: String,
    /// Generator conventions
    pub dialect: Dialect,
    /// Tables first, then views, indexed by name
    pub relations: IndexMap<String, Relation>,
}

impl DbInfo {
    pub fn new(schema: impl Into<String>, dialect: Dialect) -> Self {
        Self {
            schema: schema.into(),
            dialect,
            relations: IndexMap::new(),
        }
    }

    pub fn push(&mut self, relation: Relation) {
        self.relations.insert(relation.name.clone(), relation);
    }

    pub fn get(&self, name: &str) -> Option<&Relation> {
        self.relations.get(name)
    }

    pub fn tables(&self) -> impl Iterator<Item = &Relation> {
        self.relations.values().filter(|r| !r.is_view())
    }

    pub fn views(&self) -> impl Iterator<Item = &Relation> {
        self.relations.values().filter(|r| r.is_view())
    }
}
