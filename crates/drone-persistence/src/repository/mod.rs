//! # Repository Module
//!
//! Repository pattern interfaces and the in-memory implementation.

pub mod memory;
pub mod traits;

pub use memory::{IdSequence, InMemoryStore, MemoryTable};
pub use traits::{Entity, EntityStore, Repository};
