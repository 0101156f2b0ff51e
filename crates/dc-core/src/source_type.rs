//! Origin tags for data sources and responses.

use serde::{Deserialize, Serialize};

/// Describes where a piece of data came from.
///
/// Used to distinguish whether information was loaded from network or
/// storage, and to keep a source from re-storing data it produced itself.
/// The ordering (`Memory < Disk < Network`) is the cheapest-first lookup
/// order used by controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// Retrieved from memory.
    Memory,
    /// Retrieved from disk.
    Disk,
    /// Retrieved from network.
    Network,
}

impl SourceType {
    /// All source types, cheapest first.
    pub const ALL: [SourceType; 3] = [Self::Memory, Self::Disk, Self::Network];

    /// Get the name of this source type.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Disk => "disk",
            Self::Network => "network",
        }
    }

    /// Check if this source type is local (memory or disk).
    pub fn is_local(&self) -> bool {
        !matches!(self, Self::Network)
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
