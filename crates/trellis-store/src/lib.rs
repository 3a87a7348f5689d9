//! Generic document store boundary
//!
//! The platform's pages talk to their database through this trait:
//! create/get/list/update/delete plus cursor pagination and numeric field
//! increments. The in-memory backend serves tests and local development;
//! a production backend lives behind the same trait.

pub mod error;
pub mod memory;
pub mod store;
pub mod types;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use store::Store;
pub use types::{Filter, Page, Record};
