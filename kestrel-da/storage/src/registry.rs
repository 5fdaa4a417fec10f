// std
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
// internal
use crate::{Protocol, StorageBackend, StorageError};

/// Backends available to this node, one per [`Protocol`].
#[derive(Clone, Default)]
pub struct StorageRegistry {
    backends: HashMap<Protocol, Arc<dyn StorageBackend>>,
}

impl StorageRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_backend(mut self, backend: Arc<dyn StorageBackend>) -> Self {
        self.register(backend);
        self
    }

    /// Replaces any backend previously registered for the same protocol.
    pub fn register(&mut self, backend: Arc<dyn StorageBackend>) {
        self.backends.insert(backend.protocol(), backend);
    }

    pub fn backend(&self, protocol: Protocol) -> Result<Arc<dyn StorageBackend>, StorageError> {
        self.backends
            .get(&protocol)
            .cloned()
            .ok_or(StorageError::BackendUnavailable(protocol))
    }

    pub fn backend_for_uri(&self, uri: &str) -> Result<Arc<dyn StorageBackend>, StorageError> {
        self.backend(Protocol::from_uri(uri)?)
    }
}

impl Debug for StorageRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.backends.keys()).finish()
    }
}
