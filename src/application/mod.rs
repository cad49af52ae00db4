//! Application layer services implementing business logic.
//!
//! This layer orchestrates domain operations by coordinating repository calls,
//! validation, and business rules. Services consume repository traits and provide
//! a clean API for HTTP handlers.
//!
//! # Available Services
//!
//! - [`services::LinkService`] - Short link creation and owner management
//! - [`services::KeyAllocator`] - Unique short key reservation
//! - [`services::ResolutionService`] - Redirect lookups with visit dispatch
//! - [`services::AnalyticsTracker`] - Visit counters and visitor sets
//! - [`services::AccountService`] - Account registration and login
//!
//! [`visit_worker`] consumes the visit queue in the background.

pub mod services;
pub mod visit_worker;
