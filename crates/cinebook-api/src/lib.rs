//! # cinebook-api
//!
//! HTTP API layer for Cinebook built on Axum.
//!
//! Provides the seat lock and booking endpoints, admin views, middleware
//! (idempotency, rate limiting, CORS, logging), extractors, DTOs, and
//! error mapping.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;
