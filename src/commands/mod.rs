//! Command handlers
//!
//! This module contains the entry points a front end calls. Each returns
//! `Result<T, String>` and logs its outcome. Commands are organized into
//! different modules based on their functionality.

pub mod accounts;
pub mod config;
pub mod import;

// Re-export all command functions for easy access
pub use accounts::*;
pub use config::*;
pub use import::*;
