//! Per-module index of contributed capability instances.
//!
//! A multi-valued map from module id to the instances that module currently
//! contributes. Empty value sets are never stored, so a module is present
//! exactly when it has at least one contribution.

use crate::capability::identity;
use crate::host::ModuleId;
use std::collections::HashMap;
use std::sync::Arc;

pub(crate) struct ModuleIndex<C: ?Sized> {
    entries: HashMap<ModuleId, Vec<Arc<C>>>,
}

impl<C: ?Sized> ModuleIndex<C> {
    pub(crate) fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub(crate) fn contains_module(&self, module_id: ModuleId) -> bool {
        self.entries.contains_key(&module_id)
    }

    /// Record an instance under a module; false if that exact instance is already there
    pub(crate) fn put(&mut self, module_id: ModuleId, instance: Arc<C>) -> bool {
        let values = self.entries.entry(module_id).or_default();
        let key = identity(&instance);
        if values.iter().any(|existing| identity(existing) == key) {
            return false;
        }
        values.push(instance);
        true
    }

    /// Drop a module's key and hand back everything it contributed
    pub(crate) fn remove_all(&mut self, module_id: ModuleId) -> Vec<Arc<C>> {
        self.entries.remove(&module_id).unwrap_or_default()
    }

    pub(crate) fn get(&self, module_id: ModuleId) -> Vec<Arc<C>> {
        self.entries.get(&module_id).cloned().unwrap_or_default()
    }

    pub(crate) fn module_ids(&self) -> Vec<ModuleId> {
        let mut ids: Vec<ModuleId> = self.entries.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Every indexed instance across all modules
    pub(crate) fn values(&self) -> impl Iterator<Item = &Arc<C>> {
        self.entries.values().flatten()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Take every entry, leaving the index empty
    pub(crate) fn drain(&mut self) -> Vec<(ModuleId, Vec<Arc<C>>)> {
        self.entries.drain().collect()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
