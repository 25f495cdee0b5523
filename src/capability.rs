//! # Capabilities
//!
//! A capability is the interface that modules contribute implementations of.
//! Registries and trackers are generic over the capability type, which is
//! normally a trait object such as `dyn ExecutorService`.

use std::sync::Arc;

/// Marker for a capability interface that modules can declare implementations of
///
/// `INTERFACE` is the fully-qualified interface name used to locate a module's
/// declaration resource and to type-check candidates.
pub trait Capability: Send + Sync + 'static {
    const INTERFACE: &'static str;
}

/// HTTP executor service contributed by transport connector modules
pub trait ExecutorService: Send + Sync + std::fmt::Debug {
    /// Human-readable connector name
    fn name(&self) -> &str;
}

impl Capability for dyn ExecutorService {
    const INTERFACE: &'static str = "connector.transport.ExecutorService";
}

/// Identity key of a shared capability instance
///
/// Two `Arc`s share an identity when they point at the same allocation,
/// regardless of any `PartialEq` the instance type may implement.
pub(crate) fn identity<C: ?Sized>(instance: &Arc<C>) -> usize {
    Arc::as_ptr(instance) as *const () as usize
}
