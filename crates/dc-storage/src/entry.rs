//! Stored entries shared by the storage backends.

use std::time::Duration;

use chrono::{DateTime, Utc};
use dc_core::{DataResponse, SourceType};
use serde::{Deserialize, Serialize};

/// A stored value with the metadata needed for expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEntry<T> {
    /// Storage key (`SourceParams::cache_key()` of the response).
    pub key: String,
    /// Origin of the stored response.
    pub origin: SourceType,
    /// When the entry was written.
    pub stored_at: DateTime<Utc>,
    /// The stored payload.
    pub data: T,
}

impl<T> StoredEntry<T> {
    /// Create an entry from a response, stamped now.
    pub fn from_response(response: &DataResponse<T>) -> Self
    where
        T: Clone,
    {
        Self {
            key: response.params.cache_key(),
            origin: response.source_type,
            stored_at: Utc::now(),
            data: response.data.clone(),
        }
    }

    /// Check if the entry is older than `ttl` at `now`. No TTL never expires.
    pub fn is_expired_at(&self, ttl: Option<Duration>, now: DateTime<Utc>) -> bool {
        let Some(ttl) = ttl else {
            return false;
        };
        // TTLs past chrono's range never expire
        match chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| self.stored_at.checked_add_signed(ttl))
        {
            Some(expires_at) => now > expires_at,
            None => false,
        }
    }

    /// Check if the entry is older than `ttl` now.
    pub fn is_expired(&self, ttl: Option<Duration>) -> bool {
        self.is_expired_at(ttl, Utc::now())
    }

    /// Get the age of the entry.
    pub fn age(&self) -> Duration {
        (Utc::now() - self.stored_at).to_std().unwrap_or_default()
    }
}
