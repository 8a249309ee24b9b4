use super::Value;
use crate::{Error, Result};
use tokio_postgres::types::Type;

/// A row of catalog data as column name → value pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogRow {
    fields: Vec<(String, Value)>,
}

impl CatalogRow {
    pub fn new(fields: Vec<(String, Value)>) -> Self {
        Self { fields }
    }

    /// Decode a tokio-postgres row by its column types.
    pub fn from_pg(row: &tokio_postgres::Row) -> Result<Self> {
        let mut fields = Vec::with_capacity(row.len());
        for (idx, column) in row.columns().iter().enumerate() {
            let value = pg_value(row, idx, column.type_())?;
            fields.push((column.name().to_string(), value));
        }
        Ok(Self { fields })
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&Value> {
        self.fields
            .get(index)
            .map(|(_, value)| value)
            .ok_or(Error::MissingColumn { index })
    }

    fn mismatch(&self, index: usize, expected: &'static str, actual: &Value) -> Error {
        Error::RowDecode {
            column: self.fields[index].0.clone(),
            expected,
            actual: actual.kind(),
        }
    }

    /// A non-NULL text column.
    pub fn text(&self, index: usize) -> Result<String> {
        match self.get(index)? {
            Value::Text(s) => Ok(s.clone()),
            other => Err(self.mismatch(index, "text", other)),
        }
    }

    /// A nullable text column.
    pub fn opt_text(&self, index: usize) -> Result<Option<String>> {
        match self.get(index)? {
            Value::Null => Ok(None),
            Value::Text(s) => Ok(Some(s.clone())),
            other => Err(self.mismatch(index, "text", other)),
        }
    }

    pub fn bool(&self, index: usize) -> Result<bool> {
        match self.get(index)? {
            Value::Bool(b) => Ok(*b),
            other => Err(self.mismatch(index, "bool", other)),
        }
    }

    pub fn int(&self, index: usize) -> Result<i64> {
        match self.get(index)? {
            Value::Int(i) => Ok(*i),
            other => Err(self.mismatch(index, "int", other)),
        }
    }
}

fn pg_value(row: &tokio_postgres::Row, idx: usize, ty: &Type) -> Result<Value> {
    let value: Value = if *ty == Type::BOOL {
        row.try_get::<_, Option<bool>>(idx)?.into()
    } else if *ty == Type::INT2 {
        row.try_get::<_, Option<i16>>(idx)?.map(i64::from).into()
    } else if *ty == Type::INT4 {
        row.try_get::<_, Option<i32>>(idx)?.map(i64::from).into()
    } else if *ty == Type::INT8 {
        row.try_get::<_, Option<i64>>(idx)?.into()
    } else if *ty == Type::OID {
        row.try_get::<_, Option<u32>>(idx)?.map(i64::from).into()
    } else if *ty == Type::CHAR {
        // "char" is a single byte on the wire
        row.try_get::<_, Option<i8>>(idx)?
            .map(|b| char::from(b as u8).to_string())
            .into()
    } else if *ty == Type::TEXT_ARRAY || *ty == Type::NAME_ARRAY || *ty == Type::VARCHAR_ARRAY {
        match row.try_get::<_, Option<Vec<String>>>(idx)? {
            Some(values) => Value::TextArray(values),
            None => Value::Null,
        }
    } else {
        row.try_get::<_, Option<String>>(idx)?.into()
    };
    Ok(value)
}
