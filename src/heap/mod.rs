//! The heap engine: hot store, activity marking, per-id eviction timers and
//! cold-storage spill/reload around a single keyed entity.
//!
//! Control flow: [`HeapHandler::insert_into_heap`] records the object and
//! runs the activity-marking procedure; later activity re-persists the
//! object's state and re-arms its timer; when a timer fires without being
//! re-armed, the object may veto its own deletion via
//! [`HeapItem::before_delete`], which refreshes activity instead.

pub mod cold;
pub mod item;
pub mod policy;
mod registry;
mod scheduler;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use log::{debug, error, warn};
use tokio::time::{Duration, sleep};

use crate::core::{HeapError, Result};
use cold::{ColdStorageRecord, ColdStore};
use item::{HeapItem, HeapItemFactory, HeapTypeDescriptor, SharedHeapItem};
use policy::HeapPolicy;
use registry::ScopeRegistry;
use scheduler::{EntryLifecycle, EvictionScheduler};

/// Point-in-time snapshot of heap occupancy.
#[derive(Debug, Clone, Default)]
pub struct HeapStats {
    /// Entries currently resident in memory.
    pub hot_entries: usize,
    /// Ids with a live eviction timer.
    pub armed_timers: usize,
    /// Class names registered for cold-storage reload.
    pub registered_types: usize,
    /// Whether a cold-storage root is configured.
    pub cold_storage_configured: bool,
}

struct HeapEntry {
    item: SharedHeapItem,
    lifecycle: EntryLifecycle,
    last_activity_at: DateTime<Utc>,
}

struct HeapState {
    expiration_ms: u64,
    cold: Option<ColdStore>,
    registry: ScopeRegistry,
    hot: HashMap<String, HeapEntry>,
    scheduler: EvictionScheduler,
}

/// In-process object cache keyed by string id.
///
/// Designed for a single logical owner on a cooperative scheduler: every
/// public operation is synchronous and runs to completion under the heap
/// lock; the only asynchronous execution is the deferred eviction task, which
/// re-acquires the lock when its duration elapses. Arming timers requires a
/// running Tokio runtime.
///
/// There is no shutdown-drain operation. Dropping the handler discards the
/// instance; outstanding timer tasks wake up, fail to reach the discarded
/// heap and exit.
pub struct HeapHandler {
    state: Arc<Mutex<HeapState>>,
}

impl HeapHandler {
    /// Creates a heap with the given policy.
    ///
    /// A configured cold-storage root is not validated here; failures surface
    /// lazily on the first read or write.
    pub fn new(policy: HeapPolicy) -> Self {
        Self {
            state: Arc::new(Mutex::new(HeapState {
                expiration_ms: policy.expiration_ms,
                cold: policy.cold_storage_root.map(ColdStore::new),
                registry: ScopeRegistry::default(),
                hot: HashMap::new(),
                scheduler: EvictionScheduler::default(),
            })),
        }
    }

    /// Heap without cold storage.
    pub fn in_memory(expiration_ms: u64) -> Self {
        Self::new(HeapPolicy::default().with_expiration_ms(expiration_ms))
    }

    /// True iff `id` is currently resident in memory.
    pub fn has_instance(&self, id: &str) -> bool {
        self.state
            .lock()
            .map(|state| state.hot.contains_key(id))
            .unwrap_or(false)
    }

    /// Looks up `id`. A resident entry is returned as a clone of the stored
    /// handle; otherwise, with cold storage configured, the persisted record
    /// is reconstructed through the scope registry.
    ///
    /// Lookup has no side effects: activity is not marked, and a
    /// reconstructed object is NOT inserted back into the hot store. Callers
    /// that want it cached hot again insert it explicitly.
    pub fn get_from_heap(&self, id: &str) -> Result<Option<SharedHeapItem>> {
        let state = self.state.lock()?;
        Self::resolve(&state, id)
    }

    /// Stores `item` under `id`, runs the activity-marking procedure for it
    /// and returns the stored handle.
    ///
    /// Fails with [`HeapError::DuplicateId`] if `id` is already resident; the
    /// existing entry is left untouched. Requires a running Tokio runtime
    /// when the configured expiration is non-zero.
    pub fn insert_into_heap(
        &self,
        id: impl Into<String>,
        item: impl HeapItem + 'static,
    ) -> Result<SharedHeapItem> {
        let id = id.into();
        let shared: SharedHeapItem = Arc::new(Mutex::new(item));

        let mut state = self.state.lock()?;
        if state.hot.contains_key(&id) {
            return Err(HeapError::DuplicateId(id));
        }
        state.hot.insert(
            id.clone(),
            HeapEntry {
                item: shared.clone(),
                lifecycle: EntryLifecycle::Active,
                last_activity_at: Utc::now(),
            },
        );
        Self::mark_activity_inner(&mut state, &self.state, &id)?;
        Ok(shared)
    }

    /// Marks activity for `id`: persists current state to cold storage (when
    /// configured) and resets the eviction timer.
    ///
    /// This is the sole writer of cold-storage records. Mutating an item
    /// through its handle without calling `mark_activity` afterwards leaves
    /// the persisted record stale.
    ///
    /// Returns `Ok(false)` when `id` resolves to nothing. An id that exists
    /// only in cold storage is evaluated in place: the reconstructed instance
    /// is re-persisted and a timer is armed, but it is not inserted into the
    /// hot store.
    pub fn mark_activity(&self, id: &str) -> Result<bool> {
        let mut state = self.state.lock()?;
        Self::mark_activity_inner(&mut state, &self.state, id)
    }

    /// Lists persisted record names, or `None` when no cold-storage root is
    /// configured. Directory-listing semantics: a point-in-time snapshot in
    /// filesystem enumeration order, names as stored (e.g. `a.json`).
    pub fn list_cold_storage(&self) -> Result<Option<Vec<String>>> {
        let state = self.state.lock()?;
        match state.cold.as_ref() {
            Some(cold) => Ok(Some(cold.list()?)),
            None => Ok(None),
        }
    }

    /// Registers a type descriptor in the reload scope, silently replacing
    /// any descriptor previously registered under the same class name.
    pub fn add_to_scope(&self, descriptor: HeapTypeDescriptor) {
        if let Ok(mut state) = self.state.lock() {
            state.registry.register(descriptor);
        }
    }

    /// Registers a factory type in the reload scope.
    pub fn add_type_to_scope<T: HeapItemFactory>(&self) {
        self.add_to_scope(HeapTypeDescriptor::of::<T>());
    }

    /// Point-in-time occupancy snapshot.
    pub fn stats(&self) -> HeapStats {
        self.state
            .lock()
            .map(|state| HeapStats {
                hot_entries: state.hot.len(),
                armed_timers: state.scheduler.armed(),
                registered_types: state.registry.len(),
                cold_storage_configured: state.cold.is_some(),
            })
            .unwrap_or_default()
    }

    /// Lookup shared by `get_from_heap` and the activity-marking path. Hot
    /// store first; cold storage is only consulted on a miss.
    fn resolve(state: &HeapState, id: &str) -> Result<Option<SharedHeapItem>> {
        if let Some(entry) = state.hot.get(id) {
            return Ok(Some(entry.item.clone()));
        }

        let Some(cold) = state.cold.as_ref() else {
            return Ok(None);
        };
        let Some(record) = cold.read(id)? else {
            return Ok(None);
        };

        let ColdStorageRecord { class, memory } = record;
        let descriptor = state
            .registry
            .resolve(&class)
            .ok_or_else(|| HeapError::UnknownClass(class.clone()))?;
        let instance = descriptor.construct();
        if !instance.lock()?.load_state(memory) {
            // structural validation of reloaded payloads is out of scope
            warn!(
                "state restore reported failure for '{}' (class '{}')",
                id, class
            );
        }
        debug!("reconstructed '{}' (class '{}') from cold storage", id, class);
        Ok(Some(instance))
    }

    /// The activity-marking procedure: resolve, persist, re-arm. Runs under
    /// the heap lock; also re-entered from the timer callback on veto.
    fn mark_activity_inner(
        state: &mut HeapState,
        shared: &Arc<Mutex<HeapState>>,
        id: &str,
    ) -> Result<bool> {
        let Some(item) = Self::resolve(state, id)? else {
            return Ok(false);
        };

        if let Some(cold) = state.cold.as_ref() {
            let record = {
                let guard = item.lock()?;
                ColdStorageRecord {
                    class: guard.type_name().to_string(),
                    memory: guard.save_state(),
                }
            };
            cold.write(id, &record)?;
            debug!("persisted '{}' (class '{}') to cold storage", id, record.class);
        }

        if let Some(entry) = state.hot.get_mut(id) {
            if entry.lifecycle == EntryLifecycle::PendingDeletion {
                debug!("'{}' returned to active after deletion veto", id);
            }
            entry.lifecycle = EntryLifecycle::Active;
            entry.last_activity_at = Utc::now();
        }

        Self::arm_timer(state, shared, id, &item);
        Ok(true)
    }

    /// Cancels and replaces the timer for `id`. A zero expiration arms
    /// nothing: the entry never auto-evicts.
    ///
    /// The spawned task holds only a weak reference to the heap internals, so
    /// discarding the whole `HeapHandler` lets outstanding timers die.
    fn arm_timer(
        state: &mut HeapState,
        shared: &Arc<Mutex<HeapState>>,
        id: &str,
        item: &SharedHeapItem,
    ) {
        if state.expiration_ms == 0 {
            return;
        }

        let weak = Arc::downgrade(shared);
        let task_id = id.to_string();
        let task_item = item.clone();
        let after = Duration::from_millis(state.expiration_ms);
        let handle = tokio::spawn(async move {
            sleep(after).await;
            let Some(state) = weak.upgrade() else {
                return;
            };
            if let Err(err) = HeapHandler::expire(&state, &task_id, &task_item) {
                error!("eviction of '{}' failed: {}", task_id, err);
            }
        });
        state.scheduler.arm(id, handle);
    }

    /// Timer-expiry callback: asks the object whether deletion may proceed,
    /// then either removes it from the hot store or treats the refusal as a
    /// veto and refreshes activity. The cold-storage record, if any, is left
    /// untouched by eviction.
    fn expire(shared: &Arc<Mutex<HeapState>>, id: &str, item: &SharedHeapItem) -> Result<()> {
        let mut state = shared.lock()?;
        state.scheduler.consume(id);
        if let Some(entry) = state.hot.get_mut(id) {
            entry.lifecycle = EntryLifecycle::PendingDeletion;
        }

        let allow = item.lock()?.before_delete();
        if allow {
            // removal of a non-resident id (cold-marked) is a no-op
            if let Some(entry) = state.hot.remove(id) {
                debug!(
                    "evicted '{}' from hot store (last active {})",
                    id, entry.last_activity_at
                );
            }
        } else {
            warn!("deletion of '{}' vetoed by before_delete, refreshing activity", id);
            Self::mark_activity_inner(&mut state, shared, id)?;
        }
        Ok(())
    }
}
