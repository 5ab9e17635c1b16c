use std::sync::Arc;

use dashmap::DashMap;

use super::{Origin, OriginKey, ThrottleConfig};

/// Lazily creates and hands out the per-origin throttling state.
///
/// Origins are created on demand the first time a request targets them.
/// Concurrent creation races are resolved through the `DashMap` entry API,
/// so exactly one [`Origin`] instance ever exists per key.
#[derive(Debug)]
pub(crate) struct OriginPool {
    /// Map of origin to throttling state, created on-demand
    origins: DashMap<OriginKey, Arc<Origin>>,

    /// Throttling applied to every origin
    config: ThrottleConfig,
}

impl OriginPool {
    pub(crate) fn new(config: ThrottleConfig) -> Self {
        Self {
            origins: DashMap::new(),
            config,
        }
    }

    /// Get the throttling state for `key`, creating it on first use.
    pub(crate) fn get_or_create(&self, key: OriginKey) -> Arc<Origin> {
        if let Some(origin) = self.origins.get(&key) {
            return origin.clone();
        }

        let origin = Arc::new(Origin::new(key.clone(), &self.config));

        // Handle the race where another task created it concurrently
        match self.origins.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(entry) => entry.get().clone(),
            dashmap::mapref::entry::Entry::Vacant(entry) => entry.insert(origin).clone(),
        }
    }

    /// The number of origins seen so far
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.origins.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_created_on_demand() {
        let pool = OriginPool::new(ThrottleConfig::default());
        assert_eq!(pool.len(), 0);

        let origin = pool.get_or_create(OriginKey::from("example.com"));
        assert_eq!(pool.len(), 1);
        assert_eq!(origin.key.as_str(), "example.com");
    }

    #[test]
    fn test_origin_reuse() {
        let pool = OriginPool::new(ThrottleConfig::default());

        let first = pool.get_or_create(OriginKey::from("example.com"));
        let second = pool.get_or_create(OriginKey::from("example.com"));

        assert_eq!(pool.len(), 1);
        // Should be the same instance
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_distinct_origins_get_distinct_state() {
        let pool = OriginPool::new(ThrottleConfig::default());

        let a = pool.get_or_create(OriginKey::from("a.example.com"));
        let b = pool.get_or_create(OriginKey::from("b.example.com"));

        assert_eq!(pool.len(), 2);
        assert!(!Arc::ptr_eq(&a, &b));
    }
}
