//! # Module Lifecycle Tracker
//!
//! Keeps a shared [`CapabilityRegistry`] in step with the modules that are
//! currently active in the host environment.
//!
//! ## Overview
//!
//! The tracker subscribes to host lifecycle events and maintains a per-module
//! index of the capability instances each module contributed:
//!
//! ```text
//! HostEnvironment ──event / catch-up scan──▶ ModuleLifecycleTracker
//!                                              │ per-module index update
//!                                              ▼
//!                                        CapabilityRegistry add / remove
//! ```
//!
//! - `Started` contributes: declared names are discovered, instantiated, added
//!   to the registry and recorded under the module's id.
//! - `Stopping` and `Stopped` withdraw: everything indexed under the module is
//!   removed from the registry and the module's key is dropped.
//! - Every other event kind is ignored.
//!
//! `start`, `stop` and event handling are serialized by one mutex per tracker,
//! so at any quiescent point the union of the index equals this tracker's
//! contributions to the registry.
//!
//! ## Catch-up ordering
//!
//! `start` subscribes before scanning already-active modules. Neither call
//! into the host is made under the tracker lock, so a host that delivers
//! events while holding its own locks cannot deadlock against the scan. The
//! scan itself runs under the lock: a module an event already contributed is
//! found indexed and skipped, and a module whose stop was already handled no
//! longer reports itself active.
//!
//! A started tracker must be stopped before it is dropped. Dropping it while
//! started makes the listener the host still holds inert and withdraws its
//! contributions, but the subscription itself leaks until the host drops it.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use connector_registry::{
//!     CapabilityFactory, ConnectorRegistry, ConnectorTracker, ExecutorService,
//!     HostEnvironment, MetadataLookup, TrackerConfig,
//! };
//! use std::sync::Arc;
//!
//! # fn example(
//! #     host: &dyn HostEnvironment,
//! #     lookup: impl MetadataLookup + 'static,
//! #     factory: impl CapabilityFactory<dyn ExecutorService> + 'static,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(ConnectorRegistry::new());
//! let tracker = ConnectorTracker::new(registry.clone(), lookup, factory, TrackerConfig::from_env()?);
//!
//! tracker.start(host);
//! for connector in registry.snapshot() {
//!     println!("available connector: {}", connector.name());
//! }
//! tracker.stop(host);
//! # Ok(())
//! # }
//! ```

mod module_index;

use crate::capability::{Capability, ExecutorService};
use crate::config::TrackerConfig;
use crate::discovery::{
    instantiate_available, service_resource_path, CapabilityFactory, MetadataLookup,
};
use crate::host::{
    HostEnvironment, LifecycleEvent, LifecycleEventKind, LifecycleListener, Module, ModuleId,
    SubscriptionId,
};
use crate::logging::log_module_transition;
use crate::registry::CapabilityRegistry;
use chrono::{DateTime, Utc};
use module_index::ModuleIndex;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Tracker for executor-service connectors
pub type ConnectorTracker = ModuleLifecycleTracker<dyn ExecutorService>;

/// Tracker-level lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrackerPhase {
    Stopped,
    Started,
}

/// Tracks capability contributions of modules as they start and stop
pub struct ModuleLifecycleTracker<C: Capability + ?Sized> {
    core: Arc<TrackerCore<C>>,
}

/// Shared state handed to the host as the lifecycle listener
struct TrackerCore<C: Capability + ?Sized> {
    registry: Arc<CapabilityRegistry<C>>,
    lookup: Box<dyn MetadataLookup>,
    factory: Box<dyn CapabilityFactory<C>>,
    resource_path: String,
    config: TrackerConfig,
    state: Mutex<TrackerState<C>>,
    stats: TrackerCounters,
}

struct TrackerState<C: ?Sized> {
    phase: TrackerPhase,
    /// Incremented by every start; a start that finds it changed was stopped
    generation: u64,
    subscription: Option<SubscriptionId>,
    index: ModuleIndex<C>,
}

impl<C: ?Sized> TrackerState<C> {
    fn is_current(&self, generation: u64) -> bool {
        self.phase == TrackerPhase::Started && self.generation == generation
    }
}

#[derive(Default)]
struct TrackerCounters {
    events_received: AtomicU64,
    events_ignored: AtomicU64,
    modules_contributed: AtomicU64,
    modules_withdrawn: AtomicU64,
    instances_contributed: AtomicU64,
    discovery_failures: AtomicU64,
    instantiation_failures: AtomicU64,
    last_event_at: Mutex<Option<DateTime<Utc>>>,
}

/// Point-in-time tracker statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackerStats {
    pub phase: TrackerPhase,
    pub indexed_modules: usize,
    pub indexed_instances: usize,
    pub events_received: u64,
    pub events_ignored: u64,
    pub modules_contributed: u64,
    pub modules_withdrawn: u64,
    pub instances_contributed: u64,
    pub discovery_failures: u64,
    pub instantiation_failures: u64,
    pub last_event_at: Option<DateTime<Utc>>,
}

impl<C: Capability + ?Sized> ModuleLifecycleTracker<C> {
    /// Create a stopped tracker feeding `registry`
    pub fn new(
        registry: Arc<CapabilityRegistry<C>>,
        lookup: impl MetadataLookup + 'static,
        factory: impl CapabilityFactory<C> + 'static,
        config: TrackerConfig,
    ) -> Self {
        let resource_path = config
            .resource_path
            .clone()
            .unwrap_or_else(service_resource_path::<C>);

        Self {
            core: Arc::new(TrackerCore {
                registry,
                lookup: Box::new(lookup),
                factory: Box::new(factory),
                resource_path,
                config,
                state: Mutex::new(TrackerState {
                    phase: TrackerPhase::Stopped,
                    generation: 0,
                    subscription: None,
                    index: ModuleIndex::new(),
                }),
                stats: TrackerCounters::default(),
            }),
        }
    }

    /// Subscribe to lifecycle events and contribute every already-active module
    ///
    /// Calling `start` on a started tracker logs a warning and does nothing; the
    /// tracker never holds more than one subscription. The host is never called
    /// while the tracker lock is held, so a host may deliver events under its
    /// own locks.
    pub fn start(&self, host: &dyn HostEnvironment) {
        let generation = {
            let mut state = self.core.state.lock();
            if state.phase == TrackerPhase::Started {
                warn!(
                    capability = C::INTERFACE,
                    "Tracker already started, ignoring repeated start"
                );
                return;
            }
            state.phase = TrackerPhase::Started;
            state.generation += 1;
            state.generation
        };

        let listener: Arc<dyn LifecycleListener> = self.core.clone();
        let subscription = host.subscribe(listener);
        {
            let mut state = self.core.state.lock();
            if !state.is_current(generation) {
                drop(state);
                debug!(
                    capability = C::INTERFACE,
                    "Tracker stopped while subscribing, releasing subscription"
                );
                host.unsubscribe(subscription);
                return;
            }
            state.subscription = Some(subscription);
        }

        let modules = host.modules();

        let mut state = self.core.state.lock();
        if !state.is_current(generation) {
            return;
        }
        // Activity is re-read under the lock: a module whose stop was already
        // handled reports an inactive state here.
        let mut scanned = 0;
        for module in modules.iter().filter(|m| m.state().is_active()) {
            self.core.contribute(&mut state, module.as_ref());
            scanned += 1;
        }

        info!(
            capability = C::INTERFACE,
            resource = %self.core.resource_path,
            deployed_modules = modules.len(),
            active_modules = scanned,
            instances = state.index.len(),
            "Module lifecycle tracker started"
        );
    }

    /// Unsubscribe and tear down this tracker's bookkeeping
    ///
    /// With `purge_on_stop` every instance this tracker contributed is removed
    /// from the shared registry; otherwise only the local index is cleared. The
    /// registry itself is never cleared. Stopping a stopped tracker is a no-op.
    pub fn stop(&self, host: &dyn HostEnvironment) {
        let Some(subscription) = self.core.tear_down() else {
            return;
        };

        // Events still in flight see the Stopped phase and are dropped.
        if let Some(subscription) = subscription {
            host.unsubscribe(subscription);
        }
    }

    pub fn phase(&self) -> TrackerPhase {
        self.core.state.lock().phase
    }

    pub fn registry(&self) -> &Arc<CapabilityRegistry<C>> {
        &self.core.registry
    }

    /// Declaration resource consulted for every module
    pub fn resource_path(&self) -> &str {
        &self.core.resource_path
    }

    /// Instances currently indexed under a module
    pub fn contributions(&self, module_id: ModuleId) -> Vec<Arc<C>> {
        self.core.state.lock().index.get(module_id)
    }

    /// Modules with at least one indexed instance, in id order
    pub fn indexed_modules(&self) -> Vec<ModuleId> {
        self.core.state.lock().index.module_ids()
    }

    /// Number of instances across the whole index
    pub fn contribution_count(&self) -> usize {
        self.core.state.lock().index.len()
    }

    /// Whether every indexed instance is present in the registry
    ///
    /// One direction only: the registry may also hold other contributors'
    /// instances, so compare snapshots to check the reverse.
    pub fn index_is_registered(&self) -> bool {
        let state = self.core.state.lock();
        let registered = state
            .index
            .values()
            .all(|instance| self.core.registry.contains(instance));
        registered
    }

    pub fn stats(&self) -> TrackerStats {
        let (phase, indexed_modules, indexed_instances) = {
            let state = self.core.state.lock();
            (
                state.phase,
                state.index.module_ids().len(),
                state.index.len(),
            )
        };
        let counters = &self.core.stats;

        TrackerStats {
            phase,
            indexed_modules,
            indexed_instances,
            events_received: counters.events_received.load(Ordering::Relaxed),
            events_ignored: counters.events_ignored.load(Ordering::Relaxed),
            modules_contributed: counters.modules_contributed.load(Ordering::Relaxed),
            modules_withdrawn: counters.modules_withdrawn.load(Ordering::Relaxed),
            instances_contributed: counters.instances_contributed.load(Ordering::Relaxed),
            discovery_failures: counters.discovery_failures.load(Ordering::Relaxed),
            instantiation_failures: counters.instantiation_failures.load(Ordering::Relaxed),
            last_event_at: *counters.last_event_at.lock(),
        }
    }
}

impl<C: Capability + ?Sized> LifecycleListener for ModuleLifecycleTracker<C> {
    fn on_lifecycle_event(&self, event: &LifecycleEvent) {
        self.core.on_lifecycle_event(event);
    }
}

impl<C: Capability + ?Sized> std::fmt::Debug for ModuleLifecycleTracker<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleLifecycleTracker")
            .field("capability", &C::INTERFACE)
            .field("resource_path", &self.core.resource_path)
            .field("phase", &self.phase())
            .finish()
    }
}

impl<C: Capability + ?Sized> Drop for ModuleLifecycleTracker<C> {
    fn drop(&mut self) {
        // The host still holds the listener; without a host handle the best we
        // can do is make it inert and take back this tracker's contributions.
        if let Some(Some(subscription)) = self.core.tear_down() {
            warn!(
                capability = C::INTERFACE,
                subscription = subscription.0,
                "Tracker dropped while started; call stop() to release the host subscription"
            );
        }
    }
}

impl<C: Capability + ?Sized> LifecycleListener for TrackerCore<C> {
    fn on_lifecycle_event(&self, event: &LifecycleEvent) {
        self.stats.events_received.fetch_add(1, Ordering::Relaxed);
        *self.stats.last_event_at.lock() = Some(Utc::now());

        let mut state = self.state.lock();
        if state.phase != TrackerPhase::Started {
            self.stats.events_ignored.fetch_add(1, Ordering::Relaxed);
            debug!(
                kind = %event.kind,
                module_id = %event.module_id(),
                "Tracker stopped, dropping lifecycle event"
            );
            return;
        }

        match event.kind {
            LifecycleEventKind::Started => self.contribute(&mut state, event.module.as_ref()),
            LifecycleEventKind::Stopping | LifecycleEventKind::Stopped => {
                self.withdraw(&mut state, event.module.as_ref(), event.kind)
            }
            other => {
                self.stats.events_ignored.fetch_add(1, Ordering::Relaxed);
                trace!(kind = %other, module_id = %event.module_id(), "Ignoring lifecycle event");
            }
        }
    }
}

impl<C: Capability + ?Sized> TrackerCore<C> {
    /// Mark the tracker stopped and drop its bookkeeping
    ///
    /// Returns `None` when already stopped, otherwise the subscription to
    /// release (absent if a concurrent start had not stored it yet).
    fn tear_down(&self) -> Option<Option<SubscriptionId>> {
        let mut state = self.state.lock();
        if state.phase == TrackerPhase::Stopped {
            debug!(capability = C::INTERFACE, "Tracker already stopped");
            return None;
        }
        state.phase = TrackerPhase::Stopped;

        let mut purged = 0;
        if self.config.purge_on_stop {
            for (_, instances) in state.index.drain() {
                for instance in &instances {
                    if self.registry.remove(instance) {
                        purged += 1;
                    }
                }
            }
        } else {
            state.index.clear();
        }

        info!(
            capability = C::INTERFACE,
            purged = purged,
            purge_on_stop = self.config.purge_on_stop,
            "Module lifecycle tracker stopped"
        );
        Some(state.subscription.take())
    }

    fn contribute(&self, state: &mut TrackerState<C>, module: &dyn Module) {
        let module_id = module.id();
        if state.index.contains_module(module_id) {
            debug!(
                module_id = %module_id,
                module = module.symbolic_name(),
                "Module already contributed, skipping"
            );
            return;
        }

        let names = match self.lookup.declared_names(module, &self.resource_path) {
            Ok(names) => names,
            Err(err) => {
                self.stats.discovery_failures.fetch_add(1, Ordering::Relaxed);
                warn!(
                    module_id = %module_id,
                    module = module.symbolic_name(),
                    error = %err,
                    "Could not read declared implementations, treating as none"
                );
                return;
            }
        };
        if names.is_empty() {
            trace!(module_id = %module_id, "Module declares no implementations");
            return;
        }

        let outcome = instantiate_available(module, &names, self.factory.as_ref());
        self.stats
            .instantiation_failures
            .fetch_add(outcome.failures as u64, Ordering::Relaxed);

        let mut added = 0;
        for instance in outcome.instances {
            if state.index.put(module_id, instance.clone()) {
                self.registry.add(instance);
                added += 1;
            }
        }
        if added == 0 {
            return;
        }

        self.stats.modules_contributed.fetch_add(1, Ordering::Relaxed);
        self.stats
            .instances_contributed
            .fetch_add(added as u64, Ordering::Relaxed);
        if self.config.log_contributions {
            log_module_transition(
                "contribute",
                module_id,
                module.symbolic_name(),
                C::INTERFACE,
                added,
            );
        }
    }

    fn withdraw(&self, state: &mut TrackerState<C>, module: &dyn Module, kind: LifecycleEventKind) {
        let module_id = module.id();
        let instances = state.index.remove_all(module_id);
        if instances.is_empty() {
            trace!(module_id = %module_id, kind = %kind, "Nothing to withdraw");
            return;
        }

        for instance in &instances {
            self.registry.remove(instance);
        }

        self.stats.modules_withdrawn.fetch_add(1, Ordering::Relaxed);
        if self.config.log_contributions {
            log_module_transition(
                "withdraw",
                module_id,
                module.symbolic_name(),
                C::INTERFACE,
                instances.len(),
            );
        }
    }
}
