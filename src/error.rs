use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum LedgerError {
    #[error("split configuration not found; the ledger is not configured yet")]
    #[diagnostic(
        code(splitbook::configuration_missing),
        help("provide a settings.csv with person1_name, person2_name and person1_percentage")
    )]
    ConfigurationMissing,
    #[error("Ledger store error: {0}")]
    #[diagnostic(code(splitbook::upstream))]
    Upstream(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Validation error: {0}")]
    #[diagnostic(code(splitbook::validation))]
    Validation(String),
    #[error("Not found: {0}")]
    #[diagnostic(code(splitbook::not_found))]
    NotFound(String),
    #[error("Duplicate record: {0}")]
    #[diagnostic(code(splitbook::duplicate))]
    Duplicate(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LedgerError {
    /// Wraps any store-side failure so it surfaces to callers unchanged.
    pub fn upstream<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Upstream(Box::new(err))
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for LedgerError {
    fn from(err: rocksdb::Error) -> Self {
        Self::upstream(err)
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
