//! # Storage Module
//!
//! Durable key-value slots that hold the serialized scan history.
//!
//! The history store only ever touches one key, but backends are generic
//! over the key so several logical stores can share a database.
//!
//! ## Backends
//! - `SqliteStore` - Persistent storage using SQLite
//! - `InMemoryStore` - For testing

mod memory;
mod sqlite;
mod traits;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;
pub use traits::SlotStore;
