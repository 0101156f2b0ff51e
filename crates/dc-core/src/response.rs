//! Origin-tagged responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::params::SourceParams;
use crate::source_type::SourceType;

/// A successful response from a data source.
///
/// The `source_type` tag records where the data came from, so other sources
/// can decide whether to persist it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataResponse<T> {
    /// The payload.
    pub data: T,
    /// Where the payload came from.
    pub source_type: SourceType,
    /// Params the payload was requested with.
    #[serde(default)]
    pub params: SourceParams,
    /// When the response was produced.
    pub received_at: DateTime<Utc>,
}

impl<T> DataResponse<T> {
    /// Create a new response with default params.
    pub fn new(data: T, source_type: SourceType) -> Self {
        Self {
            data,
            source_type,
            params: SourceParams::default(),
            received_at: Utc::now(),
        }
    }

    /// Set the params the payload was requested with.
    pub fn with_params(mut self, params: SourceParams) -> Self {
        self.params = params;
        self
    }

    /// Check if this response came from the given source type.
    pub fn is_from(&self, source_type: SourceType) -> bool {
        self.source_type == source_type
    }

    /// Transform the payload, keeping the tags.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> DataResponse<U> {
        DataResponse {
            data: f(self.data),
            source_type: self.source_type,
            params: self.params,
            received_at: self.received_at,
        }
    }

    /// Consume the response, returning the payload.
    pub fn into_data(self) -> T {
        self.data
    }
}
