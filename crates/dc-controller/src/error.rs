//! Controller errors.

use dc_core::SourceType;
use thiserror::Error;

/// Errors from assembling a [`DataController`](crate::DataController).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControllerError {
    /// A source for this origin is already registered.
    #[error("a {0} source is already registered")]
    DuplicateSource(SourceType),
}
