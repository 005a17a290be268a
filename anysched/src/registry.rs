//! Backend type name → manager constructor table

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use tracing::debug;

use crate::backends::{DockerSwarmManager, KubernetesManager, MarathonManager, NomadManager};
use crate::errors::SchedError;
use crate::manager::{BackendKind, Manager};
use crate::models::ManagerConfig;

/// Builds a manager from a backend address
pub type Constructor = Arc<dyn Fn(&str) -> Result<Box<dyn Manager>, SchedError> + Send + Sync>;

#[derive(Default)]
struct Inner {
    constructors: HashMap<String, Constructor>,
    /// Registration order
    known: Vec<String>,
}

/// Table of known backend types
#[derive(Default)]
pub struct Registry {
    inner: Mutex<Inner>,
}

impl Registry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the four builtin backends
    pub fn with_builtin_backends() -> Self {
        let registry = Self::new();
        register_builtin_backends(&registry);
        registry
    }

    /// Add a backend type
    ///
    /// # Panics
    ///
    /// If `name` is already registered.
    pub fn register<F>(&self, name: &str, constructor: F)
    where
        F: Fn(&str) -> Result<Box<dyn Manager>, SchedError> + Send + Sync + 'static,
    {
        let duplicate = {
            let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            if inner.constructors.contains_key(name) {
                true
            } else {
                inner
                    .constructors
                    .insert(name.to_string(), Arc::new(constructor));
                inner.known.push(name.to_string());
                false
            }
        };

        if duplicate {
            panic!("backend type {:?} is already registered", name);
        }
        debug!("Registered backend type {}", name);
    }

    /// Build a manager for `config`
    pub fn resolve(&self, config: &ManagerConfig) -> Result<Box<dyn Manager>, SchedError> {
        let constructor = {
            let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            match inner.constructors.get(&config.kind) {
                Some(constructor) => constructor.clone(),
                None => {
                    return Err(SchedError::UnknownBackend {
                        kind: config.kind.clone(),
                        known: inner.known.clone(),
                    })
                }
            }
        };
        constructor(&config.address)
    }

    /// Forget every registered backend type
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.constructors.clear();
        inner.known.clear();
    }

    /// Registered names in registration order
    pub fn known_types(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .known
            .clone()
    }
}

/// Register kubernetes, marathon, dockerswarm and nomad on `registry`
pub fn register_builtin_backends(registry: &Registry) {
    registry.register(BackendKind::Kubernetes.as_str(), KubernetesManager::boxed);
    registry.register(BackendKind::Marathon.as_str(), MarathonManager::boxed);
    registry.register(BackendKind::DockerSwarm.as_str(), DockerSwarmManager::boxed);
    registry.register(BackendKind::Nomad.as_str(), NomadManager::boxed);
}

/// Process-wide registry, built with the builtin backends on first use
pub fn global() -> &'static Registry {
    static GLOBAL: OnceLock<Registry> = OnceLock::new();
    GLOBAL.get_or_init(Registry::with_builtin_backends)
}
