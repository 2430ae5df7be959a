//! Core library for the weatherflow ETL service.
//!
//! This crate defines:
//! - HTTP gateways to the upstream forecast, sensor-catalog and radar APIs
//! - Pure transformers deriving the persisted record batches
//! - The append-only Postgres persistence gateway
//! - Region/table resolution and per-region pipeline runs
//!
//! It is used by `weatherflow-cli`, but can also be reused by other
//! binaries or services.

pub mod config;
pub mod error;
pub mod fetch;
pub mod model;
pub mod pipeline;
pub mod precipitation;
pub mod region;
pub mod store;
pub mod transform;

pub use config::Config;
pub use error::{PipelineError, Result};
pub use pipeline::Pipeline;
pub use region::{Region, Table};
pub use store::Store;
