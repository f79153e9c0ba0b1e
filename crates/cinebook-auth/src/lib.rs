//! # cinebook-auth
//!
//! Bearer token handling for the Cinebook booking API. Tokens are issued by
//! the identity service; this crate verifies them and reads the caller's id
//! and role. The encoder exists for operator tooling and tests.

pub mod jwt;

pub use jwt::{Claims, JwtDecoder, JwtEncoder};
