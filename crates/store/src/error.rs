use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Any store I/O failure. Propagated to the caller; retry policy, if
    /// any, belongs to the adapter behind the port.
    #[error("storage failure: {0}")]
    Storage(String),

    /// Referenced fingerprint missing and auto-provisioning itself failed.
    #[error("no fingerprint for '{0}' and auto-provisioning failed")]
    NotFound(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Storage(format!("record serialization: {}", err))
    }
}
