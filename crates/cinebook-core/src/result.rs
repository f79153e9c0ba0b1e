//! `Result` alias used throughout the workspace.

use crate::error::AppError;

pub type AppResult<T> = Result<T, AppError>;
