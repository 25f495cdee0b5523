//! # Registry Infrastructure
//!
//! Shared, concurrency-safe storage for capability instances.
//!
//! ## Architecture
//!
//! ```text
//! Registry Infrastructure
//! └── CapabilityRegistry    (identity-keyed instance set, shared via Arc)
//! ```
//!
//! The registry is explicitly constructed and injected. Several trackers, and any
//! number of consumers, may hold the same `Arc<CapabilityRegistry<C>>`.

pub mod capability_registry;

pub use capability_registry::{CapabilityRegistry, ConnectorRegistry, RegistryStats};
