use thiserror::Error;

/// A classification that cannot degrade to text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    /// An array column whose element type the catalog did not tell us.
    #[error("unable to get array element type for `{db_type}`")]
    MissingArrayElement { db_type: String },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to {step}: {source}")]
    Connect {
        step: &'static str,
        #[source]
        source: tokio_postgres::Error,
    },

    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// A failure reported by a non-postgres [`Connection`](crate::Connection).
    #[error("query failed: {0}")]
    Query(String),

    #[error("failed to close database connection: {0}")]
    Close(String),

    #[error("tls setup failed: {0}")]
    Tls(#[from] rustls::Error),

    #[error("unexpected number of columns in enums table: {0}")]
    EnumRowShape(usize),

    #[error("failed to scan enum values to array: {0}")]
    EnumValues(String),

    #[error("column `{column}` holds {actual}, expected {expected}")]
    RowDecode {
        column: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("row has no column {index}")]
    MissingColumn { index: usize },

    #[error("cannot classify column `{column}` of `{relation}`: {source}")]
    Classify {
        relation: String,
        column: String,
        #[source]
        source: ClassifyError,
    },

    #[error("view `{schema}.{view}` not found in view metadata")]
    ViewNotFound { schema: String, view: String },

    #[error("{step} for `{relation}`: {source}")]
    Introspect {
        relation: String,
        step: &'static str,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Attach the relation and step that failed.
    pub(crate) fn context(self, relation: &str, step: &'static str) -> Self {
        Error::Introspect {
            relation: relation.to_string(),
            step,
            source: Box::new(self),
        }
    }

    /// The server's own wording of the failure, for matching on known
    /// catalog incompatibilities.
    pub fn message(&self) -> String {
        match self {
            Error::Postgres(e) => match e.as_db_error() {
                Some(db) => db.message().to_string(),
                None => e.to_string(),
            },
            Error::Query(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
