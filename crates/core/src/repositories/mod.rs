//! Persistence backends.
//!
//! Services depend only on the [`DocumentStore`] trait; `FileStore` is the production backend
//! and `MemoryStore` backs tests and throwaway deployments.

pub mod file_store;
pub mod memory_store;
pub mod store;

pub use file_store::FileStore;
pub use memory_store::MemoryStore;
pub use store::{Collection, DocumentStore, StoreError, StoreResult};
