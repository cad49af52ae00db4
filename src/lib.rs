//! # shortkey
//!
//! A URL shortener with atomic key allocation and per-link visit analytics,
//! built with Axum and Redis.
//!
//! ## Architecture
//!
//! This crate follows Clean Architecture principles with clear layer separation:
//!
//! - **Domain Layer** ([`domain`]) - Entities, repository traits, and the
//!   key-value store and identity capabilities
//! - **Application Layer** ([`application`]) - Key allocation, resolution,
//!   analytics, and the background visit worker
//! - **Infrastructure Layer** ([`infrastructure`]) - Redis and in-memory
//!   stores, key-value repositories, JWT identity provider
//! - **API Layer** ([`api`]) - REST API handlers, DTOs, and middleware
//!
//! ## Features
//!
//! - Hash-derived short keys claimed with a single atomic conditional write
//! - Custom slugs with conflict detection
//! - Optional per-record time-to-live shared by the record and its statistics
//! - Asynchronous visit counting and unique-visitor tracking
//! - Accounts with argon2 password hashes and JWT bearer tokens
//!
//! ## Quick Start
//!
//! ```bash
//! export JWT_SECRET="change-me"
//! export REDIS_URL="redis://localhost:6379/0"
//!
//! cargo run
//! ```
//!
//! ## Configuration
//!
//! Service configuration is loaded from environment variables via [`config::Config`].
//! See [`config`] module for available options.

pub mod api;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod state;
pub mod utils;

pub mod config;
pub mod logging;
pub mod server;

pub mod routes;

pub use error::AppError;
pub use state::AppState;

/// Commonly used types for external consumers.
///
/// Re-exports frequently used types to simplify imports for library users
/// and integration tests.
pub mod prelude {
    pub use crate::application::services::{
        AccountService, AnalyticsTracker, KeyAllocator, LinkService, ResolutionService,
    };
    pub use crate::domain::entities::{ClickStats, NewUrlRecord, UrlRecord};
    pub use crate::domain::store::KeyValueStore;
    pub use crate::domain::visit_event::VisitEvent;
    pub use crate::error::AppError;
    pub use crate::state::AppState;
}
