//! Model class registry.
//!
//! Built once at process start from the static manifest and a
//! [`RegistryConfig`], then read-only: a mapping from qualified name
//! (`aprender.<module>.<ClassName>`) to everything needed to instantiate an
//! adapter for that class. Key order follows the configured module list, and
//! manifest order within a module.
//!
//! Simple-name lookup is supported for ergonomics, with a deliberate
//! collision policy: a simple name shared by classes from different modules
//! is ambiguous and fails lookup with the qualified candidates, instead of
//! silently resolving to whichever module registered last.
//!
//! # Example
//!
//! ```
//! use servir::registry::{ModelRegistry, RegistryConfig};
//!
//! let registry = ModelRegistry::from_config(&RegistryConfig::default())
//!     .expect("default config names only known modules");
//! assert!(registry.contains("aprender.linear_model.LinearRegression"));
//! ```

mod error;

pub use error::{RegistryError, Result};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::adapter::{Adapter, AdapterSettings};
use crate::capability::CapabilitySet;
use crate::manifest::{self, ModelEntry};

/// Which modules to register and which to freeze.
///
/// Static configuration data: the serving layer typically deserializes this
/// once at startup, or uses [`RegistryConfig::default`] for the full
/// manifest with the standard deny-list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Module names to register, in order.
    #[serde(default = "default_modules")]
    pub modules: Vec<String>,

    /// Modules whose adapters get no update capability.
    #[serde(default = "default_deny_update")]
    pub deny_update: Vec<String>,
}

fn default_modules() -> Vec<String> {
    manifest::MODULES.iter().map(ToString::to_string).collect()
}

fn default_deny_update() -> Vec<String> {
    manifest::FROZEN_MODULES.iter().map(ToString::to_string).collect()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self { modules: default_modules(), deny_update: default_deny_update() }
    }
}

impl RegistryConfig {
    /// Restrict registration to the given modules, keeping the standard
    /// deny-list.
    pub fn with_modules<I, S>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.modules = modules.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the update deny-list.
    pub fn with_deny_update<I, S>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deny_update = modules.into_iter().map(Into::into).collect();
        self
    }
}

/// One registered model class: manifest entry plus capability policy.
#[derive(Debug, Clone, Copy)]
pub struct ModelSpec {
    entry: &'static ModelEntry,
    capabilities: CapabilitySet,
}

impl ModelSpec {
    /// Qualified registry key.
    pub fn qualified_name(&self) -> String {
        self.entry.qualified_name()
    }

    /// The capability set adapters for this class are constructed with.
    pub fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }

    /// Owning module name.
    pub fn module(&self) -> &'static str {
        self.entry.module
    }

    /// Simple class name.
    pub fn name(&self) -> &'static str {
        self.entry.name
    }
}

#[derive(Debug)]
enum SimpleBinding {
    Unique(String),
    Ambiguous(Vec<String>),
}

/// Read-only mapping from qualified name to registered model class.
#[derive(Debug)]
pub struct ModelRegistry {
    order: Vec<String>,
    specs: HashMap<String, ModelSpec>,
    simple: HashMap<String, SimpleBinding>,
}

impl ModelRegistry {
    /// Build the registry from the built-in manifest.
    ///
    /// A configured module name absent from the manifest is fatal; the whole
    /// construction fails rather than registering a partial set.
    pub fn from_config(config: &RegistryConfig) -> Result<Self> {
        Self::from_entries(manifest::entries(), config)
    }

    fn from_entries(entries: &'static [ModelEntry], config: &RegistryConfig) -> Result<Self> {
        let mut order = Vec::new();
        let mut specs = HashMap::new();
        let mut simple: HashMap<String, SimpleBinding> = HashMap::new();

        for module in &config.modules {
            if !entries.iter().any(|e| e.module == module.as_str()) {
                return Err(RegistryError::UnknownModule(module.clone()));
            }

            let updatable = !config.deny_update.iter().any(|m| m == module);
            let capabilities =
                if updatable { CapabilitySet::all() } else { CapabilitySet::frozen() };

            for entry in entries.iter().filter(|e| e.module == module.as_str()) {
                let qualified = entry.qualified_name();

                match simple.get_mut(entry.name) {
                    None => {
                        simple.insert(
                            entry.name.to_string(),
                            SimpleBinding::Unique(qualified.clone()),
                        );
                    }
                    Some(SimpleBinding::Unique(existing)) => {
                        let candidates = vec![existing.clone(), qualified.clone()];
                        simple
                            .insert(entry.name.to_string(), SimpleBinding::Ambiguous(candidates));
                    }
                    Some(SimpleBinding::Ambiguous(candidates)) => {
                        candidates.push(qualified.clone());
                    }
                }

                order.push(qualified.clone());
                specs.insert(qualified, ModelSpec { entry, capabilities });
            }
        }

        Ok(Self { order, specs, simple })
    }

    /// Look up a registered class by qualified name.
    pub fn get(&self, qualified: &str) -> Option<&ModelSpec> {
        self.specs.get(qualified)
    }

    /// Look up a registered class by simple name.
    ///
    /// Fails with [`RegistryError::AmbiguousName`] when the simple name is
    /// shared across modules.
    pub fn get_simple(&self, name: &str) -> Result<&ModelSpec> {
        match self.simple.get(name) {
            None => Err(RegistryError::UnknownModel(name.to_string())),
            Some(SimpleBinding::Ambiguous(candidates)) => Err(RegistryError::AmbiguousName {
                name: name.to_string(),
                candidates: candidates.join(", "),
            }),
            Some(SimpleBinding::Unique(qualified)) => self
                .specs
                .get(qualified)
                .ok_or_else(|| RegistryError::UnknownModel(name.to_string())),
        }
    }

    /// Instantiate an adapter for a qualified name.
    pub fn instantiate(&self, qualified: &str, settings: AdapterSettings) -> Result<Adapter> {
        let spec = self
            .get(qualified)
            .ok_or_else(|| RegistryError::UnknownModel(qualified.to_string()))?;
        Ok(Adapter::new(spec.entry, spec.capabilities, settings))
    }

    /// Qualified names in registration order.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// Whether a qualified name is registered.
    pub fn contains(&self, qualified: &str) -> bool {
        self.specs.contains_key(qualified)
    }

    /// Number of registered classes.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
