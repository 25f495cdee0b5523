//! # Host Environment Contracts
//!
//! Narrow interfaces to the module system that hosts the registry. The host
//! enumerates deployed modules, manages listener subscriptions, and delivers
//! lifecycle events, possibly from many threads at once.

use std::fmt;
use std::sync::Arc;

/// Stable identifier of a deployed module for its current activation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(pub u64);

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ModuleId {
    fn from(id: u64) -> Self {
        ModuleId(id)
    }
}

/// Activation state of a module as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleState {
    Installed,
    Resolved,
    Starting,
    Active,
    Stopping,
    Uninstalled,
}

impl ModuleState {
    pub fn is_active(&self) -> bool {
        matches!(self, ModuleState::Active)
    }
}

/// Kind of lifecycle transition carried by a [`LifecycleEvent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEventKind {
    Installed,
    Resolved,
    LazyActivation,
    Starting,
    Started,
    Stopping,
    Stopped,
    Updated,
    Unresolved,
    Uninstalled,
}

impl fmt::Display for LifecycleEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleEventKind::Installed => "installed",
            LifecycleEventKind::Resolved => "resolved",
            LifecycleEventKind::LazyActivation => "lazy_activation",
            LifecycleEventKind::Starting => "starting",
            LifecycleEventKind::Started => "started",
            LifecycleEventKind::Stopping => "stopping",
            LifecycleEventKind::Stopped => "stopped",
            LifecycleEventKind::Updated => "updated",
            LifecycleEventKind::Unresolved => "unresolved",
            LifecycleEventKind::Uninstalled => "uninstalled",
        };
        f.write_str(name)
    }
}

/// Handle to a deployed module
pub trait Module: Send + Sync {
    fn id(&self) -> ModuleId;

    fn state(&self) -> ModuleState;

    /// Name used in log output
    fn symbolic_name(&self) -> &str {
        "unnamed_module"
    }
}

/// A module transitioned between activation states
#[derive(Clone)]
pub struct LifecycleEvent {
    pub kind: LifecycleEventKind,
    pub module: Arc<dyn Module>,
}

impl LifecycleEvent {
    pub fn new(kind: LifecycleEventKind, module: Arc<dyn Module>) -> Self {
        Self { kind, module }
    }

    pub fn module_id(&self) -> ModuleId {
        self.module.id()
    }
}

impl fmt::Debug for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleEvent")
            .field("kind", &self.kind)
            .field("module_id", &self.module.id())
            .field("module", &self.module.symbolic_name())
            .finish()
    }
}

/// Receiver of lifecycle events
///
/// Implementations must tolerate concurrent delivery from multiple threads.
pub trait LifecycleListener: Send + Sync {
    fn on_lifecycle_event(&self, event: &LifecycleEvent);
}

/// Token returned by [`HostEnvironment::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// The module system hosting the registry
///
/// Events may be delivered on any thread, including while the host holds
/// locks that `modules` or `subscribe` also take. Trackers never call into the
/// host while holding their own lock.
pub trait HostEnvironment: Send + Sync {
    /// Currently deployed modules with their activation state
    fn modules(&self) -> Vec<Arc<dyn Module>>;

    fn subscribe(&self, listener: Arc<dyn LifecycleListener>) -> SubscriptionId;

    /// Unsubscribing an unknown id is a no-op
    fn unsubscribe(&self, subscription: SubscriptionId);
}
