//! Core types shared across the data controller crates.
//!
//! This crate provides:
//! - `SourceType` - Where a piece of data came from (memory, disk, network)
//! - `SourceParams` - Parameters passed from a request to a data source
//! - `DataResponse` - Origin-tagged payload delivered to success callbacks
//! - `ResponseError` / `StorageError` - Failure types
//! - `SourceConfig` - Serializable data source configuration

mod config;
mod error;
mod params;
mod response;
mod source_type;

pub use config::*;
pub use error::*;
pub use params::*;
pub use response::*;
pub use source_type::*;
