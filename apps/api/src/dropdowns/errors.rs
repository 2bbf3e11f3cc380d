use thiserror::Error;

/// Failures raised by the lookup-table core.
#[derive(Debug, Error)]
pub enum DropdownError {
    /// Unmapped dropdown identifier. Always a client or configuration bug.
    #[error("unknown dropdown table '{0}'")]
    UnknownTable(String),

    /// Table resolves but has no column mapping registered.
    #[error("no column mapping registered for table '{0}'")]
    MissingColumnMapping(&'static str),

    /// Company id with leading or trailing whitespace.
    #[error("company id '{0}' has surrounding whitespace")]
    InvalidTenantId(String),

    /// A replace batch carried rows for more than one tenant.
    #[error("batch mixes tenant scopes {first} and {second}")]
    MixedTenantBatch { first: String, second: String },

    /// The batch's own tenant differs from the scope the caller asked for.
    #[error("batch tenant scope {batch} does not match requested scope {requested}")]
    TenantScopeMismatch { requested: String, batch: String },

    /// Flat records sent to a two-level table, or the reverse.
    #[error("table '{0}' does not accept this record shape")]
    RecordShapeMismatch(&'static str),

    #[error("import failed: {0}")]
    Import(String),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl From<csv::Error> for DropdownError {
    fn from(e: csv::Error) -> Self {
        DropdownError::Import(e.to_string())
    }
}
