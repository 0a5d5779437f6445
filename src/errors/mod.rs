//! Centralized error handling module
//!
//! All library operations return [`AppResult`]; the binary wraps these in
//! `anyhow` at the top level.

pub mod types;

pub use types::{AppError, AppResult};
