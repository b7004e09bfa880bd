//! Inventory store boundary.
//!
//! This module defines the key-value collaborator the purchase engine and
//! recommendation query run against: atomic counters, sets, and an optimistic
//! transaction primitive (watch keys, commit a batch only if none changed).

pub mod in_memory;
pub mod keys;
#[cfg(feature = "redis")]
pub mod redis;
pub mod r#trait;

pub use in_memory::{InMemoryConnection, InMemoryInventoryStore};
#[cfg(feature = "redis")]
pub use self::redis::{RedisConnection, RedisInventoryStore};
pub use r#trait::{CommitOutcome, InventoryStore, StoreConnection, StoreError, WriteBatch, WriteOp};
