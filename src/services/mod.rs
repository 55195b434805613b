// Service exports
pub mod memory;
pub mod postgres;
pub mod store;

pub use memory::{MemoryStore, MemoryUnit};
pub use postgres::{IsolationLevel, PostgresStore, PostgresUnit};
pub use store::{Store, StoreError, StoreUnit};
