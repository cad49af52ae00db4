//! Backing store implementations.
//!
//! - [`RedisStore`] - Production Redis store
//! - [`MemoryStore`] - In-process store for tests and local runs

mod memory_store;
mod redis_store;

pub use memory_store::MemoryStore;
pub use redis_store::RedisStore;
