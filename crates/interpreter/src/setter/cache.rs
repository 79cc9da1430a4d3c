//! Memoized setter factories.

use super::factory::SetterFactory;
use crate::error::InterpreterError;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use xpages_traits::Definition;

/// Keyed by definition identity, so a re-registered definition compiles afresh.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FactoryKey {
    definition: usize,
    property: String,
}

#[derive(Debug)]
struct Entry {
    /// Held so the address in the key cannot be reused by another definition.
    _definition: Arc<Definition>,
    factory: Arc<SetterFactory>,
}

/// A process-wide map from `(definition, property)` to its compiled factory.
///
/// Factories are created on first use and never evicted. Concurrent first
/// compilations of the same key may both build a factory; the first one stored
/// wins and every caller receives that instance.
#[derive(Debug, Default)]
pub struct SetterCache {
    factories: RwLock<HashMap<FactoryKey, Entry>>,
}

impl SetterCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the factory for `property` on `definition`, compiling it on first use.
    ///
    /// Failed compilations are not cached.
    pub fn factory_for(
        &self,
        definition: &Arc<Definition>,
        property: &str,
    ) -> Result<Arc<SetterFactory>, InterpreterError> {
        let key = FactoryKey {
            definition: Arc::as_ptr(definition) as usize,
            property: property.to_string(),
        };

        if let Ok(factories) = self.factories.read()
            && let Some(entry) = factories.get(&key)
        {
            return Ok(Arc::clone(&entry.factory));
        }

        let factory = Arc::new(SetterFactory::for_property(definition, property)?);
        match self.factories.write() {
            Ok(mut factories) => {
                let entry = factories.entry(key).or_insert_with(|| Entry {
                    _definition: Arc::clone(definition),
                    factory,
                });
                Ok(Arc::clone(&entry.factory))
            }
            Err(_) => {
                log::warn!("Setter cache lock poisoned; factory for '{}' not memoized", property);
                Ok(factory)
            }
        }
    }

    /// Returns 0 if the lock is poisoned.
    pub fn len(&self) -> usize {
        self.factories.read().map(|f| f.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use crate::setter::FactoryKind;
    use xpages_traits::{Property, PropertyBag, ValueType};

    fn definition(namespace: &str) -> Arc<Definition> {
        typed_definition(namespace, "java.lang.Object")
    }

    fn typed_definition(namespace: &str, java_type: &str) -> Arc<Definition> {
        Definition::builder(namespace, "text", || Box::new(PropertyBag::new("Text")))
            .property(Property::simple("value", java_type))
            .build()
    }

    #[test]
    fn test_factory_is_memoized_per_definition_and_property() {
        let cache = SetterCache::new();
        let def = definition("urn:a");
        let first = cache.factory_for(&def, "value").unwrap();
        let second = cache.factory_for(&def, "value").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);

        cache.factory_for(&def, "id").unwrap();
        cache.factory_for(&definition("urn:b"), "value").unwrap();
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_replaced_definition_compiles_its_own_factory() {
        let cache = SetterCache::new();
        let as_int = typed_definition("urn:a", "int");
        let first = cache.factory_for(&as_int, "value").unwrap();
        assert_eq!(first.kind(), &FactoryKind::Generic(ValueType::Int));

        let as_string = typed_definition("urn:a", "java.lang.String");
        let second = cache.factory_for(&as_string, "value").unwrap();
        assert_eq!(second.kind(), &FactoryKind::Generic(ValueType::String));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_failures_are_not_cached() {
        let cache = SetterCache::new();
        let def = definition("urn:a");
        assert!(cache.factory_for(&def, "nope").is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_first_use_shares_one_factory() {
        let cache = Arc::new(SetterCache::new());
        let def = definition("urn:a");
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let def = Arc::clone(&def);
                thread::spawn(move || cache.factory_for(&def, "value").unwrap())
            })
            .collect();
        let factories: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let stored = cache.factory_for(&def, "value").unwrap();
        assert!(factories.iter().all(|f| Arc::ptr_eq(f, &stored)));
        assert_eq!(cache.len(), 1);
    }
}
