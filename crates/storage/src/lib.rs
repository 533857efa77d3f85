#![forbid(unsafe_code)]

pub mod local;
pub mod repository;
pub mod selector;
pub mod sqlite;

pub use local::LocalStore;
pub use repository::{InMemoryRepository, ProgressStore, StorageError};
pub use selector::{Identity, Loaded, StoreBackend, StoreSelector};
