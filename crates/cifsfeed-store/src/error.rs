use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no transaction is open")]
    NoTransaction,

    #[error("a transaction is already open")]
    TransactionOpen,

    #[cfg(feature = "duckdb")]
    #[error("duckdb error: {0}")]
    DuckDb(#[from] ::duckdb::Error),

    #[error("{0}")]
    Other(String),
}
