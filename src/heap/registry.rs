use std::collections::HashMap;

use crate::heap::item::HeapTypeDescriptor;

/// Class-name to type-descriptor map used to reinstantiate objects loaded
/// from cold storage.
///
/// Populated explicitly by the owner of the heap before any reload can
/// succeed. Entries live for the whole process and are never pruned;
/// re-registering a name silently replaces the previous descriptor.
#[derive(Default)]
pub(crate) struct ScopeRegistry {
    descriptors: HashMap<String, HeapTypeDescriptor>,
}

impl ScopeRegistry {
    pub fn register(&mut self, descriptor: HeapTypeDescriptor) {
        self.descriptors
            .insert(descriptor.type_name().to_string(), descriptor);
    }

    pub fn resolve(&self, name: &str) -> Option<&HeapTypeDescriptor> {
        self.descriptors.get(name)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }
}
