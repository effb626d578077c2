//! Shared infrastructure for the NeuroScan analysis service
//!
//! Houses the pieces that are independent of any single HTTP handler:
//! error types, configuration resolution, database initialization, the
//! analysis history store, and the static disease-information catalog.

pub mod config;
pub mod db;
pub mod disease;
pub mod error;

pub use error::{Error, Result};
