//! Background tasks for Cinebook.
//!
//! This crate provides:
//! - A cron scheduler that runs periodic tasks in process
//! - The task trait and its error type
//! - The refund sweep and the exhausted-refund report

pub mod executor;
pub mod scheduler;
pub mod tasks;

pub use executor::{TaskExecutionError, TaskHandler};
pub use scheduler::CronScheduler;
