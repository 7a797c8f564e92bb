// ============================================================================
// RustMemHeap Library
// ============================================================================

//! In-memory object heap with activity-based eviction and cold-storage
//! reload.
//!
//! The heap holds arbitrary stateful objects keyed by string id, evicts them
//! after a period of inactivity and can optionally persist their serialized
//! state to disk (one JSON record per id) so they can be reconstructed later
//! from an explicitly registered class scope.
//!
//! Persistence is active, not passive: only [`HeapHandler::mark_activity`]
//! (invoked directly, or implicitly by insert) writes cold-storage records.
//! Mutating an object through its handle without marking activity leaves the
//! persisted copy stale.
//!
//! # Examples
//!
//! ```
//! use rustmemheap::{
//!     HeapHandler, HeapItem, HeapItemFactory, HeapItemState, HeapPolicy,
//! };
//! use serde_json::json;
//!
//! #[derive(Default)]
//! struct Session {
//!     user: String,
//! }
//!
//! impl HeapItem for Session {
//!     fn type_name(&self) -> &'static str {
//!         "Session"
//!     }
//!
//!     fn save_state(&self) -> HeapItemState {
//!         json!({ "user": self.user })
//!     }
//!
//!     fn load_state(&mut self, state: HeapItemState) -> bool {
//!         match state.get("user").and_then(|v| v.as_str()) {
//!             Some(user) => {
//!                 self.user = user.to_string();
//!                 true
//!             }
//!             None => false,
//!         }
//!     }
//! }
//!
//! impl HeapItemFactory for Session {
//!     fn factory_type_name() -> &'static str {
//!         "Session"
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> rustmemheap::Result<()> {
//!     let heap = HeapHandler::new(HeapPolicy::default().with_expiration_ms(30_000));
//!     heap.add_type_to_scope::<Session>();
//!
//!     heap.insert_into_heap("alice", Session { user: "alice".into() })?;
//!     assert!(heap.has_instance("alice"));
//!
//!     // keep the entry alive past the next 30 seconds
//!     heap.mark_activity("alice")?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod heap;

// Re-export main types for convenience
pub use crate::core::{HeapError, Result};
pub use crate::heap::cold::{ColdStorageRecord, ColdStore};
pub use crate::heap::item::{
    HeapItem, HeapItemConstructor, HeapItemFactory, HeapItemState, HeapTypeDescriptor,
    SharedHeapItem,
};
pub use crate::heap::policy::HeapPolicy;
pub use crate::heap::{HeapHandler, HeapStats};
