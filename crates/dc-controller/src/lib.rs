//! Multi-origin request dispatch over data sources.
//!
//! This crate provides:
//! - `DataController` - At most one `DataSource` per origin, in Memory → Disk → Network order
//! - `DataControllerRequest` - Builder that dispatches one request across the sources
//! - `DispatchMode` - Issue all sources at once, or cascade until one answers
//!
//! Every successful response is offered to each source's storage before the
//! request's success handler runs, so a network answer lands in the memory
//! and disk sources.
//!
//! # Example
//!
//! ```ignore
//! use dc_controller::{DataController, DispatchMode};
//!
//! let controller = DataController::new()
//!     .with_source(memory_source)?
//!     .with_source(network_source)?;
//!
//! controller
//!     .request()
//!     .mode(DispatchMode::Cascade)
//!     .on_success(|resp| render(resp.data))
//!     .on_error(|err| report(err))
//!     .execute();
//! ```

mod controller;
mod error;
mod request;
#[cfg(test)]
mod testing;

pub use controller::*;
pub use error::*;
pub use request::*;

/// Tracing target for controller events.
pub const TRACING_TARGET: &str = "dc_controller";
