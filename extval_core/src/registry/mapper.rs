use super::catalog::ClassCatalog;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Proposes a catalog name for a source, or passes.
pub trait NameMapper<S: ?Sized>: Send + Sync {
    fn create_name(&self, source: &S) -> Option<String>;
}

impl<S, F> NameMapper<S> for F
where
    S: ?Sized,
    F: Fn(&S) -> Option<String> + Send + Sync,
{
    fn create_name(&self, source: &S) -> Option<String> {
        self(source)
    }
}

/// Proposes the same name for every source.
#[derive(Debug, Clone)]
pub struct FixedName(pub String);

impl<S: ?Sized> NameMapper<S> for FixedName {
    fn create_name(&self, _source: &S) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Ordered chain of name mappers in front of a class catalog.
///
/// The first proposed name that instantiates wins and is memoized under the
/// caller's key for the lifetime of the registry. Names that fail to
/// instantiate are logged and skipped.
pub struct MappingRegistry<S: ?Sized, T: ?Sized> {
    role: &'static str,
    mappers: Vec<Arc<dyn NameMapper<S>>>,
    catalog: ClassCatalog<T>,
    cache: RwLock<HashMap<String, Arc<T>>>,
}

impl<S: ?Sized, T: ?Sized> MappingRegistry<S, T> {
    pub fn new(role: &'static str, catalog: ClassCatalog<T>) -> Self {
        Self {
            role,
            mappers: Vec::new(),
            catalog,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn role(&self) -> &'static str {
        self.role
    }

    /// Appends a mapper with the lowest precedence so far.
    pub fn add_mapper(&mut self, mapper: impl NameMapper<S> + 'static) {
        self.mappers.push(Arc::new(mapper));
    }

    pub fn push_mapper(&mut self, mapper: Arc<dyn NameMapper<S>>) {
        self.mappers.push(mapper);
    }

    /// Inserts a mapper consulted before all others.
    pub fn add_mapper_first(&mut self, mapper: impl NameMapper<S> + 'static) {
        self.mappers.insert(0, Arc::new(mapper));
    }

    pub fn catalog(&self) -> &ClassCatalog<T> {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut ClassCatalog<T> {
        &mut self.catalog
    }

    /// Names proposed for `source`, in precedence order.
    pub fn candidate_names(&self, source: &S) -> Vec<String> {
        self.mappers
            .iter()
            .filter_map(|mapper| mapper.create_name(source))
            .collect()
    }

    pub fn cached(&self, key: &str) -> Option<Arc<T>> {
        self.cache.read().get(key).cloned()
    }

    pub fn resolve(&self, key: &str, source: &S) -> Option<Arc<T>> {
        if let Some(instance) = self.cached(key) {
            trace!(role = self.role, key = %key, "Resolved from cache");
            return Some(instance);
        }

        for name in self.candidate_names(source) {
            match self.catalog.instantiate(&name) {
                Ok(instance) => {
                    debug!(role = self.role, key = %key, name = %name, "Resolved mapping");
                    let mut cache = self.cache.write();
                    return Some(Arc::clone(cache.entry(key.to_string()).or_insert(instance)));
                }
                Err(error) => {
                    warn!(role = self.role, key = %key, name = %name, error = %error, "Candidate rejected");
                }
            }
        }

        trace!(role = self.role, key = %key, "No mapping found");
        None
    }
}
