//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete backing stores, repositories and identity verification.
//!
//! # Modules
//!
//! - [`store`] - Backing stores (Redis and in-memory implementations)
//! - [`persistence`] - Repository implementations over a key-value store
//! - [`identity`] - JWT identity provider

pub mod identity;
pub mod persistence;
pub mod store;
