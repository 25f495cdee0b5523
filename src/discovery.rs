//! # Implementation Discovery
//!
//! Finds the implementation names a module declares for a capability and turns
//! them into instances through a host-supplied factory.
//!
//! ## Declaration format
//!
//! A module declares implementations in a text resource at
//! `META-INF/services/<interface>`:
//!
//! ```text
//! # transport connectors shipped by this module
//! com.example.transport.OkHttpExecutorService
//! com.example.transport.JerseyExecutorService   # legacy
//! ```
//!
//! One name per line; `#` starts a comment; blank lines are ignored.
//!
//! Every failure here is per-candidate. A module whose declaration cannot be
//! read contributes nothing, and a candidate that fails to instantiate is
//! skipped without affecting its siblings.

use crate::capability::Capability;
use crate::error::{DiscoveryError, InstantiationError};
use crate::host::Module;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Directory holding service declaration resources inside a module
pub const SERVICES_DIRECTORY: &str = "META-INF/services";

/// Default declaration resource path for a capability
pub fn service_resource_path<C: Capability + ?Sized>() -> String {
    format!("{SERVICES_DIRECTORY}/{}", C::INTERFACE)
}

/// Looks up the implementation names a module declares at a resource path
pub trait MetadataLookup: Send + Sync {
    fn declared_names(
        &self,
        module: &dyn Module,
        resource_path: &str,
    ) -> Result<Vec<String>, DiscoveryError>;
}

/// Reads a text resource from a module's isolated context
pub trait ResourceReader: Send + Sync {
    /// `Ok(None)` when the module does not carry the resource
    fn read_resource(
        &self,
        module: &dyn Module,
        path: &str,
    ) -> Result<Option<String>, DiscoveryError>;
}

/// [`MetadataLookup`] that parses service declaration resources
pub struct ResourceMetadataLookup<R> {
    reader: R,
}

impl<R: ResourceReader> ResourceMetadataLookup<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: ResourceReader> MetadataLookup for ResourceMetadataLookup<R> {
    fn declared_names(
        &self,
        module: &dyn Module,
        resource_path: &str,
    ) -> Result<Vec<String>, DiscoveryError> {
        match self.reader.read_resource(module, resource_path)? {
            Some(contents) => Ok(parse_service_declarations(&contents)),
            None => {
                debug!(
                    module_id = %module.id(),
                    module = module.symbolic_name(),
                    resource = resource_path,
                    "Module carries no service declaration"
                );
                Ok(Vec::new())
            }
        }
    }
}

/// Parse the contents of a service declaration resource
///
/// Names come back in declaration order with duplicates removed. Lines that are
/// not a qualified name are skipped.
pub fn parse_service_declarations(contents: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();

    for (line_number, raw) in contents.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        if !is_qualified_name(line) {
            warn!(
                line = line_number + 1,
                entry = line,
                "Skipping malformed service declaration"
            );
            continue;
        }
        if seen.insert(line) {
            names.push(line.to_string());
        }
    }

    names
}

/// `ident(.ident)*` where identifiers may contain `_` and `$`
pub fn is_qualified_name(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) if first.is_alphabetic() || first == '_' || first == '$' => chars
                    .all(|c| c.is_alphanumeric() || c == '_' || c == '$'),
                _ => false,
            }
        })
}

/// Creates capability instances from declared implementation names
pub trait CapabilityFactory<C: ?Sized>: Send + Sync {
    fn instantiate(
        &self,
        module: &dyn Module,
        class_name: &str,
    ) -> Result<Arc<C>, InstantiationError>;
}

impl<C, F> CapabilityFactory<C> for F
where
    C: ?Sized,
    F: Fn(&dyn Module, &str) -> Result<Arc<C>, InstantiationError> + Send + Sync,
{
    fn instantiate(
        &self,
        module: &dyn Module,
        class_name: &str,
    ) -> Result<Arc<C>, InstantiationError> {
        self(module, class_name)
    }
}

/// Result of instantiating a module's declared implementations
#[derive(Debug)]
pub struct InstantiationOutcome<C: ?Sized> {
    pub instances: Vec<Arc<C>>,
    pub failures: usize,
}

/// Instantiate every declared name, skipping candidates that fail
pub fn instantiate_available<C, F>(
    module: &dyn Module,
    class_names: &[String],
    factory: &F,
) -> InstantiationOutcome<C>
where
    C: ?Sized,
    F: CapabilityFactory<C> + ?Sized,
{
    let mut instances = Vec::with_capacity(class_names.len());
    let mut failures = 0;

    for class_name in class_names {
        match factory.instantiate(module, class_name) {
            Ok(instance) => instances.push(instance),
            Err(err) => {
                failures += 1;
                warn!(
                    module_id = %module.id(),
                    module = module.symbolic_name(),
                    class_name = %class_name,
                    error = %err,
                    "Skipping implementation that failed to instantiate"
                );
            }
        }
    }

    InstantiationOutcome {
        instances,
        failures,
    }
}
