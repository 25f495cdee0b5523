use connector_registry::{
    CapabilityFactory, DiscoveryError, ExecutorService, InstantiationError, Module, ModuleId,
    ResourceReader,
};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub const CONNECTOR_RESOURCE: &str = "META-INF/services/connector.transport.ExecutorService";

/// Connector created by [`ScriptedFactory`]
#[derive(Debug)]
pub struct TestConnector {
    pub module: ModuleId,
    pub class_name: String,
}

impl ExecutorService for TestConnector {
    fn name(&self) -> &str {
        &self.class_name
    }
}

/// Declaration resources per module; modules listed as unreadable fail discovery
#[derive(Clone, Default)]
pub struct InMemoryResources {
    inner: Arc<RwLock<ResourceTable>>,
}

#[derive(Default)]
struct ResourceTable {
    files: HashMap<(ModuleId, String), String>,
    unreadable: HashSet<ModuleId>,
}

impl InMemoryResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare implementation names for a module at the default resource path
    pub fn declare(&self, module: u64, class_names: &[&str]) {
        self.put(module, CONNECTOR_RESOURCE, &class_names.join("\n"));
    }

    pub fn put(&self, module: u64, path: &str, contents: &str) {
        self.inner
            .write()
            .files
            .insert((ModuleId(module), path.to_string()), contents.to_string());
    }

    pub fn make_unreadable(&self, module: u64) {
        self.inner.write().unreadable.insert(ModuleId(module));
    }
}

impl ResourceReader for InMemoryResources {
    fn read_resource(
        &self,
        module: &dyn Module,
        path: &str,
    ) -> Result<Option<String>, DiscoveryError> {
        let table = self.inner.read();
        if table.unreadable.contains(&module.id()) {
            return Err(DiscoveryError::ResourceUnreadable {
                module: module.symbolic_name().to_string(),
                path: path.to_string(),
                reason: "archive truncated".to_string(),
            });
        }
        Ok(table.files.get(&(module.id(), path.to_string())).cloned())
    }
}

/// Factory creating a fresh [`TestConnector`] per call
///
/// Names containing `Broken` fail to construct and names containing `Missing`
/// are reported as not found. With `reuse_instances` the same `Arc` is handed
/// back for a given module and class name.
#[derive(Clone, Default)]
pub struct ScriptedFactory {
    calls: Arc<AtomicU64>,
    reuse_instances: bool,
    cache: Arc<RwLock<HashMap<(ModuleId, String), Arc<dyn ExecutorService>>>>,
}

impl ScriptedFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reusing_instances() -> Self {
        Self {
            reuse_instances: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CapabilityFactory<dyn ExecutorService> for ScriptedFactory {
    fn instantiate(
        &self,
        module: &dyn Module,
        class_name: &str,
    ) -> Result<Arc<dyn ExecutorService>, InstantiationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if class_name.contains("Broken") {
            return Err(InstantiationError::ConstructionFailed {
                class_name: class_name.to_string(),
                reason: "constructor failed".to_string(),
            });
        }
        if class_name.contains("Missing") {
            return Err(InstantiationError::ClassNotFound {
                module: module.symbolic_name().to_string(),
                class_name: class_name.to_string(),
            });
        }

        let key = (module.id(), class_name.to_string());
        if self.reuse_instances {
            if let Some(existing) = self.cache.read().get(&key) {
                return Ok(existing.clone());
            }
        }

        let connector: Arc<dyn ExecutorService> = Arc::new(TestConnector {
            module: module.id(),
            class_name: class_name.to_string(),
        });
        if self.reuse_instances {
            self.cache.write().insert(key, connector.clone());
        }
        Ok(connector)
    }
}
