pub mod error;
pub mod memory;
pub mod ports;
pub mod sqlite;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use ports::{AuditSink, ContentStore, FingerprintStore, RunAuditRecord};
pub use sqlite::SqliteStore;
