use connector_registry::{
    HostEnvironment, LifecycleEvent, LifecycleEventKind, LifecycleListener, Module, ModuleId,
    ModuleState, SubscriptionId,
};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Module whose state the mock host can change
pub struct MockModule {
    id: ModuleId,
    name: String,
    state: Mutex<ModuleState>,
}

impl MockModule {
    pub fn set_state(&self, state: ModuleState) {
        *self.state.lock() = state;
    }
}

impl Module for MockModule {
    fn id(&self) -> ModuleId {
        self.id
    }

    fn state(&self) -> ModuleState {
        *self.state.lock()
    }

    fn symbolic_name(&self) -> &str {
        &self.name
    }
}

/// In-memory host: deployed modules, listener subscriptions, event delivery
///
/// Events are delivered on the calling thread, outside any host lock, so tests
/// can fire them from as many threads as they like.
#[derive(Default)]
pub struct MockHost {
    modules: RwLock<BTreeMap<ModuleId, Arc<MockModule>>>,
    listeners: Mutex<HashMap<SubscriptionId, Arc<dyn LifecycleListener>>>,
    next_subscription: AtomicU64,
    subscribe_calls: AtomicU64,
    unsubscribe_calls: AtomicU64,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deploy a module in the given state without emitting events
    pub fn deploy(&self, id: u64, state: ModuleState) -> Arc<MockModule> {
        let module = Arc::new(MockModule {
            id: ModuleId(id),
            name: format!("module-{id}"),
            state: Mutex::new(state),
        });
        self.modules.write().insert(ModuleId(id), module.clone());
        module
    }

    pub fn module(&self, id: u64) -> Arc<MockModule> {
        self.modules
            .read()
            .get(&ModuleId(id))
            .cloned()
            .unwrap_or_else(|| panic!("module {id} not deployed"))
    }

    /// Activate a module and announce it, like a host finishing a start
    pub fn start_module(&self, id: u64) {
        let module = self.module(id);
        module.set_state(ModuleState::Active);
        self.fire(LifecycleEventKind::Started, module);
    }

    /// Announce STOPPING then STOPPED, moving the module to Resolved
    pub fn stop_module(&self, id: u64) {
        let module = self.module(id);
        module.set_state(ModuleState::Stopping);
        self.fire(LifecycleEventKind::Stopping, module.clone());
        module.set_state(ModuleState::Resolved);
        self.fire(LifecycleEventKind::Stopped, module);
    }

    /// Deliver an event to every current listener
    pub fn fire(&self, kind: LifecycleEventKind, module: Arc<MockModule>) {
        let listeners: Vec<Arc<dyn LifecycleListener>> =
            self.listeners.lock().values().cloned().collect();
        let event = LifecycleEvent::new(kind, module);
        for listener in listeners {
            listener.on_lifecycle_event(&event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    pub fn subscribe_calls(&self) -> u64 {
        self.subscribe_calls.load(Ordering::SeqCst)
    }

    pub fn unsubscribe_calls(&self) -> u64 {
        self.unsubscribe_calls.load(Ordering::SeqCst)
    }
}

impl HostEnvironment for MockHost {
    fn modules(&self) -> Vec<Arc<dyn Module>> {
        self.modules
            .read()
            .values()
            .map(|module| module.clone() as Arc<dyn Module>)
            .collect()
    }

    fn subscribe(&self, listener: Arc<dyn LifecycleListener>) -> SubscriptionId {
        self.subscribe_calls.fetch_add(1, Ordering::SeqCst);
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::SeqCst));
        self.listeners.lock().insert(id, listener);
        id
    }

    fn unsubscribe(&self, subscription: SubscriptionId) {
        self.unsubscribe_calls.fetch_add(1, Ordering::SeqCst);
        self.listeners.lock().remove(&subscription);
    }
}
