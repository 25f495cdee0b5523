#![allow(dead_code)]

pub mod mock_host;
pub mod mock_services;
pub mod strategies;

pub use mock_host::*;
pub use mock_services::*;

use connector_registry::{
    ConnectorRegistry, ConnectorTracker, ExecutorService, ModuleId, ResourceMetadataLookup,
    TrackerConfig,
};
use std::sync::Arc;

/// Tracker wired to the in-memory resources and scripted factory
pub fn tracker_with(
    registry: Arc<ConnectorRegistry>,
    resources: &InMemoryResources,
    factory: &ScriptedFactory,
    config: TrackerConfig,
) -> ConnectorTracker {
    ConnectorTracker::new(
        registry,
        ResourceMetadataLookup::new(resources.clone()),
        factory.clone(),
        config,
    )
}

/// Sorted connector names currently in the registry
pub fn registry_members(registry: &ConnectorRegistry) -> Vec<String> {
    let mut names: Vec<String> = registry
        .snapshot()
        .iter()
        .map(|connector| connector.name().to_string())
        .collect();
    names.sort();
    names
}

/// Sorted class names a tracker holds across its whole index
pub fn indexed_members(tracker: &ConnectorTracker) -> Vec<String> {
    let mut names: Vec<String> = tracker
        .indexed_modules()
        .into_iter()
        .flat_map(|module: ModuleId| tracker.contributions(module))
        .map(|connector: Arc<dyn ExecutorService>| connector.name().to_string())
        .collect();
    names.sort();
    names
}
