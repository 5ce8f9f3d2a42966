//! In-process backend, discarded on exit.
//!
//! Used by tests and by `--backend memory` for throwaway serve sessions.

use crate::Result;
use crate::models::StateSnapshot;
use crate::storage::StateBackend;

#[derive(Default)]
pub struct MemoryBackend {
    snapshot: Option<StateSnapshot>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateBackend for MemoryBackend {
    fn load(&self) -> Result<Option<StateSnapshot>> {
        Ok(self.snapshot.clone())
    }

    fn save(&mut self, snapshot: &StateSnapshot) -> Result<()> {
        self.snapshot = Some(snapshot.clone());
        Ok(())
    }

    fn location(&self) -> String {
        "(in-memory)".to_string()
    }

    fn backend_type(&self) -> &'static str {
        "memory"
    }
}
