//! OortDb Core Library
//!
//! Shared data model for the OortDb client, including:
//! - Connection settings
//! - Column-oriented document batches
//! - Cluster metadata and fetch/query results
//! - Metadata and document-content filters

pub mod config;
pub mod filter;
pub mod models;

// Re-export commonly used types
pub use config::{ApiImpl, Settings};
pub use filter::{Where, WhereDocument};
pub use models::*;
