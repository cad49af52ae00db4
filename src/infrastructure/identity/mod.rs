//! Identity provider implementations.

mod jwt;

pub use jwt::{Claims, JwtIdentityProvider};
