//! Key-value store repository implementations.
//!
//! Concrete implementations of the domain repository traits over any
//! [`crate::domain::store::KeyValueStore`]. The key layout is documented in
//! [`keys`].
//!
//! # Repositories
//!
//! - [`KvRecordRepository`] - URL records and owner index
//! - [`KvStatsRepository`] - Visit counters and visitor sets
//! - [`KvAccountRepository`] - Identity provider accounts

pub mod keys;
pub mod kv_account_repository;
pub mod kv_record_repository;
pub mod kv_stats_repository;

pub use kv_account_repository::KvAccountRepository;
pub use kv_record_repository::KvRecordRepository;
pub use kv_stats_repository::KvStatsRepository;
