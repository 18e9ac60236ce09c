use crate::error::{ExtValError, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub type Factory<T> = Arc<dyn Fn() -> anyhow::Result<Arc<T>> + Send + Sync>;

/// Named factories standing in for instantiation by class name.
pub struct ClassCatalog<T: ?Sized> {
    factories: HashMap<String, Factory<T>>,
}

impl<T: ?Sized> ClassCatalog<T> {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> anyhow::Result<Arc<T>> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    /// Registers a factory that always returns the same shared instance.
    pub fn register_instance(&mut self, name: impl Into<String>, instance: Arc<T>)
    where
        T: Send + Sync + 'static,
    {
        self.register(name, move || Ok(Arc::clone(&instance)));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn instantiate(&self, name: &str) -> Result<Arc<T>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| ExtValError::ClassNotFound(name.to_string()))?;

        factory().map_err(|error| ExtValError::Instantiation {
            name: name.to_string(),
            reason: error.to_string(),
        })
    }
}

impl<T: ?Sized> Default for ClassCatalog<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Clone for ClassCatalog<T> {
    fn clone(&self) -> Self {
        Self {
            factories: self.factories.clone(),
        }
    }
}

impl<T: ?Sized> fmt::Debug for ClassCatalog<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassCatalog").field("names", &self.names()).finish()
    }
}
