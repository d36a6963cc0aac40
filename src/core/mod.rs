//! Core business logic module
//!
//! This module contains the domain models, the account store and its change
//! bus, the import flows and the projections views are built from.

pub mod bus;
pub mod config;
pub mod error_handling;
pub mod import_session;
pub mod models;
pub mod oauth;
pub mod projections;
pub mod reconciler;
pub mod seed;
pub mod selection;
pub mod storage;
pub mod store;
pub mod view;
pub mod youtube_client;



#[cfg(test)]
mod bus_integration_tests;


// Re-export commonly used types
pub use config::AppConfig;
pub use store::AccountStore;
