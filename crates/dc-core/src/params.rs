//! Parameters passed from a request to a data source.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Information passed between a request and the data source serving it.
///
/// It is up to each source what `data` it understands. A missing or default
/// instance means "all data"; sources substitute their configured defaults
/// when they receive one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceParams {
    /// Source-specific request data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// If true, a refresh happens even if the source is busy or its
    /// refresh strategy declines.
    #[serde(default)]
    pub force: bool,
}

impl SourceParams {
    /// Create params carrying the given data.
    pub fn new(data: impl Into<Value>) -> Self {
        Self {
            data: Some(data.into()),
            force: false,
        }
    }

    /// Create forced params with no data.
    pub fn forced() -> Self {
        Self {
            data: None,
            force: true,
        }
    }

    /// Set the data.
    pub fn with_data(mut self, data: impl Into<Value>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Mark these params as forcing a refresh.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Check if this is the canonical default instance.
    pub fn is_default(&self) -> bool {
        self.data.is_none() && !self.force
    }

    /// Stable key for the data carried by these params.
    ///
    /// `force` is not part of the key. Params without data map to the empty
    /// key.
    pub fn cache_key(&self) -> String {
        match &self.data {
            None => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(value) => value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_params_default_is_default() {
        assert!(SourceParams::default().is_default());
    }

    #[test]
    fn test_params_with_data_is_not_default() {
        assert!(!SourceParams::new("page-1").is_default());
    }

    #[test]
    fn test_params_forced_is_not_default() {
        let params = SourceParams::forced();
        assert!(params.force);
        assert!(!params.is_default());
    }

    // === Cache Key Tests ===

    #[test]
    fn test_cache_key_empty_without_data() {
        assert_eq!(SourceParams::default().cache_key(), "");
    }

    #[test]
    fn test_cache_key_string_is_unquoted() {
        assert_eq!(SourceParams::new("user:42").cache_key(), "user:42");
    }

    #[test]
    fn test_cache_key_json_value() {
        let params = SourceParams::new(json!({"page": 2}));
        assert_eq!(params.cache_key(), r#"{"page":2}"#);
    }

    #[test]
    fn test_cache_key_ignores_force() {
        let plain = SourceParams::new("feed");
        let forced = SourceParams::new("feed").with_force(true);
        assert_eq!(plain.cache_key(), forced.cache_key());
    }

    #[test]
    fn test_params_deserialize_defaults() {
        let params: SourceParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params, SourceParams::default());
    }
}
