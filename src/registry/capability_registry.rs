//! # Capability Registry
//!
//! Concurrency-safe set of capability instances shared by every component that
//! contributes or consumes them.
//!
//! ## Overview
//!
//! The registry is pure storage: it knows nothing about modules or lifecycle.
//! Membership is by instance identity, so adding the same `Arc` twice keeps a
//! single entry, while two equal-looking but separately allocated instances are
//! distinct members.
//!
//! ## Usage
//!
//! ```rust
//! use connector_registry::{ConnectorRegistry, ExecutorService};
//! use std::sync::Arc;
//!
//! #[derive(Debug)]
//! struct OkHttp;
//!
//! impl ExecutorService for OkHttp {
//!     fn name(&self) -> &str {
//!         "okhttp"
//!     }
//! }
//!
//! let registry = Arc::new(ConnectorRegistry::new());
//! let connector: Arc<dyn ExecutorService> = Arc::new(OkHttp);
//!
//! assert!(registry.add(connector.clone()));
//! assert!(!registry.add(connector.clone()));
//! assert_eq!(registry.snapshot().len(), 1);
//! ```

use crate::capability::{identity, ExecutorService};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Registry of executor-service connectors
pub type ConnectorRegistry = CapabilityRegistry<dyn ExecutorService>;

/// Identity-keyed set of shared capability instances
pub struct CapabilityRegistry<C: ?Sized> {
    members: RwLock<HashMap<usize, Arc<C>>>,
    counters: RegistryCounters,
}

#[derive(Default)]
struct RegistryCounters {
    adds: AtomicU64,
    duplicate_adds: AtomicU64,
    removes: AtomicU64,
    clears: AtomicU64,
}

impl<C: ?Sized> CapabilityRegistry<C> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            members: RwLock::new(HashMap::new()),
            counters: RegistryCounters::default(),
        }
    }

    /// Insert an instance; returns false when it was already a member
    pub fn add(&self, instance: Arc<C>) -> bool {
        let key = identity(&instance);
        let inserted = {
            let mut members = self.members.write();
            match members.entry(key) {
                std::collections::hash_map::Entry::Occupied(_) => false,
                std::collections::hash_map::Entry::Vacant(slot) => {
                    slot.insert(instance);
                    true
                }
            }
        };

        if inserted {
            self.counters.adds.fetch_add(1, Ordering::Relaxed);
        } else {
            self.counters.duplicate_adds.fetch_add(1, Ordering::Relaxed);
            debug!(instance = key, "Ignoring duplicate capability registration");
        }
        inserted
    }

    /// Remove an instance; returns false when it was not a member
    pub fn remove(&self, instance: &Arc<C>) -> bool {
        let removed = self.members.write().remove(&identity(instance)).is_some();
        if removed {
            self.counters.removes.fetch_add(1, Ordering::Relaxed);
        }
        removed
    }

    pub fn contains(&self, instance: &Arc<C>) -> bool {
        self.members.read().contains_key(&identity(instance))
    }

    /// Copy of the current members, safe to iterate while others mutate
    pub fn snapshot(&self) -> Vec<Arc<C>> {
        self.members.read().values().cloned().collect()
    }

    /// Remove every member unconditionally
    pub fn clear(&self) {
        let dropped = {
            let mut members = self.members.write();
            let dropped = members.len();
            members.clear();
            dropped
        };
        self.counters.clears.fetch_add(1, Ordering::Relaxed);
        info!(dropped = dropped, "Capability registry cleared");
    }

    pub fn len(&self) -> usize {
        self.members.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.read().is_empty()
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            members: self.len(),
            adds: self.counters.adds.load(Ordering::Relaxed),
            duplicate_adds: self.counters.duplicate_adds.load(Ordering::Relaxed),
            removes: self.counters.removes.load(Ordering::Relaxed),
            clears: self.counters.clears.load(Ordering::Relaxed),
        }
    }
}

impl<C: ?Sized> Default for CapabilityRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ?Sized> std::fmt::Debug for CapabilityRegistry<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("members", &self.len())
            .finish()
    }
}

/// Statistics about registry membership and traffic
///
/// `members` is the only membership figure. The counters record calls: a
/// duplicate add leaves `members` and `adds` untouched and is tallied in
/// `duplicate_adds` only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub members: usize,
    /// Adds that inserted a new member
    pub adds: u64,
    /// Adds of an instance that was already a member
    pub duplicate_adds: u64,
    pub removes: u64,
    pub clears: u64,
}
