//! Core domain entities representing the business data model.
//!
//! Entities are plain data structures; persistence formats live in
//! `crate::infrastructure::persistence`.
//!
//! # Entity Types
//!
//! - [`UrlRecord`] - A short key mapped to its original URL
//! - [`ClickStats`] - Visit count and distinct visitors of a short key
//! - [`Account`] - A user of the bundled identity provider
//!
//! `NewUrlRecord` is the creation draft before a short key is allocated.

pub mod account;
pub mod click_stats;
pub mod url_record;

pub use account::Account;
pub use click_stats::ClickStats;
pub use url_record::{CreateOutcome, NewUrlRecord, UrlRecord};
