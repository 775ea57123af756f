//! # Drone Persistence Library
//!
//! Entity store for the drone delivery dispatch engine.
//!
//! ## Architecture
//!
//! This crate implements the Repository pattern with a Unit of Work that
//! owns every table, so the dispatch engine depends on interfaces rather than
//! on a storage choice:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Dispatch Engine                          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   EntityStore (Unit of Work)                 │
//! │       (orders, drones, deliveries, routes, id sequence)      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                Repository<E> per entity kind                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │             MemoryTable<E> (BTreeMap keyed by id)            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use drone_persistence::{EntityStore, InMemoryStore, Repository};
//!
//! let mut store = InMemoryStore::new();
//! let id = store.next_order_id();
//! store.orders_mut().insert(Order::new(id, spec, Utc::now()))?;
//! let pending = store.orders().list_where(&|o| o.status == OrderStatus::Pending);
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod repository;

// Re-export commonly used types
pub use error::{PersistenceError, Result};
pub use repository::{Entity, EntityStore, IdSequence, InMemoryStore, MemoryTable, Repository};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
