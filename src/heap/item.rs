use std::sync::{Arc, Mutex};

/// Opaque state snapshot produced by [`HeapItem::save_state`] and consumed by
/// [`HeapItem::load_state`]. Stored verbatim in the cold-storage record.
pub type HeapItemState = serde_json::Value;

/// Shared handle to a heap-resident object.
///
/// The heap hands out clones of the handle it stores, so two lookups of the
/// same resident id compare equal under [`Arc::ptr_eq`]. A cold-storage
/// reconstruction produces a fresh handle instead.
pub type SharedHeapItem = Arc<Mutex<dyn HeapItem>>;

/// Capability contract for objects stored in the heap.
///
/// Implementors must be able to serialize their state and restore it later;
/// the deletion veto hook is optional and defaults to allowing deletion.
pub trait HeapItem: Send {
    /// Dynamic class name, used as the `class` discriminator of the
    /// cold-storage record. Must match the name a corresponding
    /// [`HeapTypeDescriptor`] is registered under, or reload will fail.
    fn type_name(&self) -> &'static str;

    /// Produces a representation sufficient to reconstruct the object.
    fn save_state(&self) -> HeapItemState;

    /// Restores internal state from a previously produced representation.
    /// Returns whether restoration succeeded.
    fn load_state(&mut self, state: HeapItemState) -> bool;

    /// Called immediately before eviction. Returning `false` vetoes the
    /// deletion: the entry's activity is refreshed instead and a fresh timer
    /// is armed, indefinitely for as long as the object keeps refusing.
    ///
    /// Runs with the heap lock held; implementations must not call back into
    /// the owning [`HeapHandler`](crate::HeapHandler).
    fn before_delete(&mut self) -> bool {
        true
    }
}

/// Factory contract for item types reconstructible from cold storage.
///
/// `Default` supplies the blank instance the registry constructs before
/// `load_state` is applied.
pub trait HeapItemFactory: HeapItem + Default + 'static {
    /// Static class name; must equal [`HeapItem::type_name`] of instances.
    fn factory_type_name() -> &'static str;
}

/// Zero-argument constructor stored in the scope registry.
pub type HeapItemConstructor = Arc<dyn Fn() -> SharedHeapItem + Send + Sync>;

/// Maps a class name to a constructor returning a blank instance, the manual
/// substitute for reflection used when reloading cold-storage records.
#[derive(Clone)]
pub struct HeapTypeDescriptor {
    type_name: String,
    construct: HeapItemConstructor,
}

impl HeapTypeDescriptor {
    pub fn new(type_name: impl Into<String>, construct: HeapItemConstructor) -> Self {
        Self {
            type_name: type_name.into(),
            construct,
        }
    }

    /// Descriptor for a factory type, constructing blank instances via
    /// `Default`.
    pub fn of<T: HeapItemFactory>() -> Self {
        Self {
            type_name: T::factory_type_name().to_string(),
            construct: Arc::new(|| Arc::new(Mutex::new(T::default()))),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Constructs a blank instance ready for `load_state`.
    pub(crate) fn construct(&self) -> SharedHeapItem {
        (self.construct)()
    }
}

impl std::fmt::Debug for HeapTypeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeapTypeDescriptor")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}
