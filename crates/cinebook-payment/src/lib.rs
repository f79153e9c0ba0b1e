//! # cinebook-payment
//!
//! Charges and refunds against an unreliable remote payment processor.
//!
//! ## Modules
//!
//! - `gateway`: The `PaymentGateway` trait and its receipts/errors
//! - `breaker`: Rolling-window circuit breaker with half-open probing
//! - `client`: `PaymentClient`, one breaker per operation, mapped to `AppError`
//! - `mock`: Randomised or scripted in-process gateway
//! - `http`: JSON-over-HTTP gateway

pub mod breaker;
pub mod client;
pub mod gateway;
pub mod http;
pub mod mock;

pub use breaker::{BreakerSnapshot, CircuitBreaker, CircuitBreakerError, State};
pub use client::PaymentClient;
pub use gateway::{ChargeReceipt, GatewayError, PaymentGateway, RefundReceipt};
pub use http::HttpPaymentGateway;
pub use mock::{MockOutcome, MockPaymentGateway};
