//! Repository trait definitions for the domain layer.
//!
//! These traits abstract data access following the Repository pattern and are
//! implemented over a [`crate::domain::store::KeyValueStore`] in the
//! infrastructure layer.
//!
//! # Available Repositories
//!
//! - [`RecordRepository`] - URL records and per-owner key index
//! - [`StatsRepository`] - Visit counters and visitor sets
//! - [`AccountRepository`] - Identity provider accounts
//!
//! Mock implementations are generated via `mockall` for unit tests.

pub mod account_repository;
pub mod record_repository;
pub mod stats_repository;

pub use account_repository::AccountRepository;
pub use record_repository::RecordRepository;
pub use stats_repository::StatsRepository;

#[cfg(test)]
pub use account_repository::MockAccountRepository;
#[cfg(test)]
pub use record_repository::MockRecordRepository;
#[cfg(test)]
pub use stats_repository::MockStatsRepository;
