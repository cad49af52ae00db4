//! Domain layer containing business entities and capability traits.
//!
//! Independent of infrastructure and presentation concerns.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions
//! - [`store`] - Atomic key-value primitives the repositories are built on
//! - [`identity`] - Bearer credential authentication capability
//! - [`visit_event`] - Visit model handed to the analytics worker
//!
//! # Visit Processing Flow
//!
//! 1. HTTP handler asks [`crate::application::services::ResolutionService`] to resolve a key
//! 2. A [`visit_event::VisitEvent`] is queued without blocking the redirect
//! 3. [`crate::application::visit_worker::run_visit_worker`] hands it to the tracker
//! 4. Counters and visitor sets are updated via [`repositories::StatsRepository`]

pub mod entities;
pub mod identity;
pub mod repositories;
pub mod store;
pub mod visit_event;
