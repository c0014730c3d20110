use std::any::{Any, TypeId};
use std::collections::HashMap;

/// A typed key-value bag carried on every `ExecutionContext`, used for out-of-band
/// communication between strategies (e.g. a custom cache-key input) without widening
/// the context's own field list for every new strategy.
#[derive(Default)]
pub struct PropertyBag {
    entries: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) -> Option<T> {
        self.entries
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|prev| prev.downcast::<T>().ok())
            .map(|boxed| *boxed)
    }

    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
    }

    pub fn get_mut<T: Send + Sync + 'static>(&mut self) -> Option<&mut T> {
        self.entries
            .get_mut(&TypeId::of::<T>())
            .and_then(|value| value.downcast_mut::<T>())
    }

    pub fn remove<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.entries
            .remove(&TypeId::of::<T>())
            .and_then(|value| value.downcast::<T>().ok())
            .map(|boxed| *boxed)
    }

    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct CacheKeyOverride(String);

    #[test]
    fn insert_get_remove_round_trip() {
        let mut bag = PropertyBag::new();
        assert!(bag.get::<CacheKeyOverride>().is_none());

        bag.insert(CacheKeyOverride("k1".into()));
        assert_eq!(
            bag.get::<CacheKeyOverride>(),
            Some(&CacheKeyOverride("k1".into()))
        );

        let removed = bag.remove::<CacheKeyOverride>();
        assert_eq!(removed, Some(CacheKeyOverride("k1".into())));
        assert!(bag.get::<CacheKeyOverride>().is_none());
    }

    #[test]
    fn distinct_types_do_not_collide() {
        let mut bag = PropertyBag::new();
        bag.insert(42u32);
        bag.insert("hello".to_string());

        assert_eq!(bag.get::<u32>(), Some(&42));
        assert_eq!(bag.get::<String>(), Some(&"hello".to_string()));
    }
}
