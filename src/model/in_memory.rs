//! InMemoryModelResolver - HashMap-backed resolver for testing and development.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{DomainObject, ModelResolver};
use crate::dispatch::DispatchError;

/// In-memory resolver backed by a HashMap.
///
/// Storage key is `"Class:id"`. Clone-friendly via Arc.
#[derive(Clone, Default)]
pub struct InMemoryModelResolver {
    storage: Arc<RwLock<HashMap<String, DomainObject>>>,
}

impl InMemoryModelResolver {
    pub fn new() -> Self {
        Self::default()
    }

    fn make_key(resource_class: &str, resource_id: &str) -> String {
        format!("{}:{}", resource_class, resource_id)
    }

    pub fn put(&self, object: DomainObject) -> Result<(), DispatchError> {
        let mut storage = self
            .storage
            .write()
            .map_err(|_| DispatchError::failed_with("StorageError", "lock poisoned"))?;
        storage.insert(Self::make_key(&object.resource_class, &object.resource_id), object);
        Ok(())
    }

    pub fn remove(
        &self,
        resource_class: &str,
        resource_id: &str,
    ) -> Result<Option<DomainObject>, DispatchError> {
        let mut storage = self
            .storage
            .write()
            .map_err(|_| DispatchError::failed_with("StorageError", "lock poisoned"))?;
        Ok(storage.remove(&Self::make_key(resource_class, resource_id)))
    }
}

impl ModelResolver for InMemoryModelResolver {
    fn find(
        &self,
        resource_class: &str,
        resource_id: &str,
    ) -> Result<Option<DomainObject>, DispatchError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| DispatchError::failed_with("StorageError", "lock poisoned"))?;
        Ok(storage.get(&Self::make_key(resource_class, resource_id)).cloned())
    }
}
