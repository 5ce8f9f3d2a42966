//! Storage backend trait and backend selection.
//!
//! This module provides different storage backends for the weekbank state
//! snapshot:
//! - `FileBackend` - local JSON file (default)
//! - `MemoryBackend` - in-process, for tests and ephemeral runs
//! - `GitHubBackend` - JSON file committed to a GitHub repository

use crate::Result;
use crate::models::StateSnapshot;

/// Trait for storage backends that persist the whole state snapshot.
///
/// The snapshot is always read and written as one unit; backends never see
/// partial updates. No conditional-write guarantee is required - last
/// writer wins.
pub trait StateBackend: Send + Sync {
    /// Load the snapshot. `None` means no state has ever been saved.
    fn load(&self) -> Result<Option<StateSnapshot>>;

    /// Persist the snapshot, replacing any existing one.
    fn save(&mut self, snapshot: &StateSnapshot) -> Result<()>;

    /// Get the storage location description (for display purposes).
    fn location(&self) -> String;

    /// Get the backend type name.
    fn backend_type(&self) -> &'static str;
}

/// Available storage backend types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// Local JSON file (default) - ~/.local/share/weekbank/state.json
    File,
    /// In-process memory, discarded on exit
    Memory,
    /// JSON file in a GitHub repository via the contents API
    GitHub,
}

impl BackendType {
    /// Parse a backend type from a string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "file" | "local" | "default" => Some(Self::File),
            "memory" | "mem" => Some(Self::Memory),
            "github" | "gh" => Some(Self::GitHub),
            _ => None,
        }
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Memory => "memory",
            Self::GitHub => "github",
        }
    }
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
