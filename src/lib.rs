#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

//! # Connector Registry
//!
//! Lifecycle-driven registry of capability implementations contributed by
//! dynamically deployed modules.
//!
//! ## Overview
//!
//! In a modular host, implementations of a capability such as an HTTP
//! [`ExecutorService`] live inside modules that start and stop at runtime. Static
//! service loading cannot see across module boundaries, so this crate keeps an
//! always-current view of the implementations that are available right now:
//!
//! - [`CapabilityRegistry`] is the shared, concurrency-safe set consumers read
//! - [`ModuleLifecycleTracker`] listens to module lifecycle events, discovers and
//!   instantiates what each module declares, and keeps the registry in step
//!
//! Every registry mutation made by a tracker is attributable to exactly one
//! module lifecycle transition, and withdrawing a module removes everything it
//! contributed.
//!
//! ## Module Organization
//!
//! - [`capability`] - Capability marker trait and the executor-service capability
//! - [`host`] - Contracts the hosting module system implements
//! - [`discovery`] - Declaration lookup, parsing, and per-candidate instantiation
//! - [`registry`] - Shared capability registry
//! - [`tracker`] - Module lifecycle tracker
//! - [`config`] - Tracker configuration
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup and helpers
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # Unit, integration, and property tests
//! ```

pub mod capability;
pub mod config;
pub mod discovery;
pub mod error;
pub mod host;
pub mod logging;
pub mod registry;
pub mod tracker;

pub use capability::{Capability, ExecutorService};
pub use config::TrackerConfig;
pub use discovery::{
    instantiate_available, parse_service_declarations, service_resource_path, CapabilityFactory,
    InstantiationOutcome, MetadataLookup, ResourceMetadataLookup, ResourceReader,
};
pub use error::{DiscoveryError, InstantiationError, RegistryError, Result};
pub use host::{
    HostEnvironment, LifecycleEvent, LifecycleEventKind, LifecycleListener, Module, ModuleId,
    ModuleState, SubscriptionId,
};
pub use registry::{CapabilityRegistry, ConnectorRegistry, RegistryStats};
pub use tracker::{ConnectorTracker, ModuleLifecycleTracker, TrackerPhase, TrackerStats};
