//! Business logic services for the application layer.

pub mod account_service;
pub mod analytics_tracker;
pub mod key_allocator;
pub mod link_service;
pub mod resolution_service;

pub use account_service::AccountService;
pub use analytics_tracker::AnalyticsTracker;
pub use key_allocator::KeyAllocator;
pub use link_service::LinkService;
pub use resolution_service::ResolutionService;
