//! Persistence layer

pub mod storage;

pub use storage::{OrderStore, StorageError, StorageResult};
