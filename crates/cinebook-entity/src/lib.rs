//! # cinebook-entity
//!
//! Domain entity models for Cinebook. Every struct in this crate
//! represents a database table row or a domain value object. All entities
//! derive `Debug`, `Clone`, `Serialize`, `Deserialize`, and database
//! entities additionally derive `sqlx::FromRow`.
//!
//! Monetary amounts are integer minor units (cents).

pub mod booking;
pub mod hall;
pub mod refund;
pub mod show;
pub mod user;
