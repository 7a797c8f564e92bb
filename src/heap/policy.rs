use std::path::PathBuf;

/// Operational policy for a heap instance.
#[derive(Debug, Clone)]
pub struct HeapPolicy {
    /// Time in milliseconds after which an entry with no activity is evicted
    /// from memory. Zero disables automatic eviction entirely.
    pub expiration_ms: u64,
    /// Root directory for cold-storage records. `None` disables cold storage.
    pub cold_storage_root: Option<PathBuf>,
}

impl Default for HeapPolicy {
    fn default() -> Self {
        Self {
            expiration_ms: 60_000,
            cold_storage_root: None,
        }
    }
}

impl HeapPolicy {
    pub fn with_expiration_ms(mut self, expiration_ms: u64) -> Self {
        self.expiration_ms = expiration_ms;
        self
    }

    pub fn with_cold_storage_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.cold_storage_root = Some(root.into());
        self
    }
}
