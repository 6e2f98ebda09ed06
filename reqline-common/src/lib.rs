//! # ReqLine Common Library
//!
//! Shared code for the ReqLine song-request service:
//! - Database models and initialization
//! - SSE event types
//! - Configuration loading
//! - Common error type

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod time;

pub use error::{Error, Result};
