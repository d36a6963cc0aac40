//! File parsing modules
//!
//! Contains the parser for account CSV uploads.

pub mod csv_parser;

// Re-export commonly used parsers
pub use csv_parser::*;
