//! Bounded cache of compiled queries.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use strata::provider::ProviderRef;
use strata::utils::ColumnSet;

use crate::compiler::CompiledQuery;
use crate::dialect::DialectKind;

/// What a query was compiled from, next to what it compiled to.
///
/// Keys only narrow the search down: a lookup matches when tree, demand and dialect are
/// structurally equal to the entry's.
#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub root: ProviderRef,
    pub demand: ColumnSet,
    pub dialect: DialectKind,
    pub compiled: Arc<CompiledQuery>,
}

impl CacheEntry {
    fn matches(&self, root: &ProviderRef, demand: &ColumnSet, dialect: DialectKind) -> bool {
        self.dialect == dialect
            && &self.demand == demand
            && (Arc::ptr_eq(&self.root, root) || self.root == *root)
    }
}

/// Least recently used set of compiled queries, safe to share between threads.
///
/// The lock is only taken for lookups and inserts.
pub struct PlanCache {
    entries: Option<Mutex<LruCache<u64, Vec<CacheEntry>>>>,
}

impl PlanCache {
    /// A cache of at most `capacity` keys. A capacity of zero caches nothing.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(|c| Mutex::new(LruCache::new(c))),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.entries.is_some()
    }

    pub fn key(root: &ProviderRef, demand: &ColumnSet, dialect: DialectKind) -> u64 {
        let mut hasher = DefaultHasher::new();
        root.hash(&mut hasher);
        demand.hash(&mut hasher);
        dialect.hash(&mut hasher);
        hasher.finish()
    }

    pub fn get(
        &self,
        root: &ProviderRef,
        demand: &ColumnSet,
        dialect: DialectKind,
    ) -> Option<Arc<CompiledQuery>> {
        let entries = self.entries.as_ref()?;
        let key = Self::key(root, demand, dialect);
        let mut entries = entries.lock();
        entries
            .get(&key)?
            .iter()
            .find(|e| e.matches(root, demand, dialect))
            .map(|e| e.compiled.clone())
    }

    /// Stores `compiled` unless an equal entry got there first, and returns the cached one.
    pub fn insert(&self, entry: CacheEntry) -> Arc<CompiledQuery> {
        let entries = match &self.entries {
            Some(entries) => entries,
            None => return entry.compiled,
        };
        let key = Self::key(&entry.root, &entry.demand, entry.dialect);
        let mut entries = entries.lock();
        let bucket = entries.get_or_insert_mut(key, Vec::new);
        if let Some(existing) = bucket
            .iter()
            .find(|e| e.matches(&entry.root, &entry.demand, entry.dialect))
        {
            return existing.compiled.clone();
        }
        let compiled = entry.compiled.clone();
        bucket.push(entry);
        compiled
    }

    /// Number of cached keys.
    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, |e| e.lock().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Some(entries) = &self.entries {
            entries.lock().clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use maplit::btreeset;
    use strata::utils::ColumnMap;

    use super::*;
    use crate::test_utils::{customers, orders};

    fn compiled(root: &ProviderRef, sql: &str) -> Arc<CompiledQuery> {
        Arc::new(CompiledQuery {
            provider: root.clone(),
            column_map: ColumnMap::identity(root.header().len()),
            sql: sql.to_string(),
            parameters: vec![],
        })
    }

    fn entry(root: &ProviderRef, dialect: DialectKind, sql: &str) -> CacheEntry {
        CacheEntry {
            root: root.clone(),
            demand: btreeset! {0},
            dialect,
            compiled: compiled(root, sql),
        }
    }

    #[test]
    fn test_hit_needs_equal_tree_demand_and_dialect() {
        let cache = PlanCache::new(4);
        cache.insert(entry(&customers(), DialectKind::Generic, "a"));

        let hit = cache.get(&customers(), &btreeset! {0}, DialectKind::Generic);
        assert_eq!("a", hit.unwrap().sql);
        assert!(cache.get(&customers(), &btreeset! {1}, DialectKind::Generic).is_none());
        assert!(cache.get(&customers(), &btreeset! {0}, DialectKind::MySql).is_none());
        assert!(cache.get(&orders(), &btreeset! {0}, DialectKind::Generic).is_none());
    }

    #[test]
    fn test_first_insert_wins() {
        let cache = PlanCache::new(4);
        assert_eq!("a", cache.insert(entry(&customers(), DialectKind::Generic, "a")).sql);
        assert_eq!("a", cache.insert(entry(&customers(), DialectKind::Generic, "b")).sql);
        assert_eq!(1, cache.len());
    }

    #[test]
    fn test_least_recently_used_is_evicted() {
        let cache = PlanCache::new(1);
        cache.insert(entry(&customers(), DialectKind::Generic, "a"));
        cache.insert(entry(&orders(), DialectKind::Generic, "b"));
        assert_eq!(1, cache.len());
        assert!(cache.get(&customers(), &btreeset! {0}, DialectKind::Generic).is_none());
    }

    #[test]
    fn test_zero_capacity_disables() {
        let cache = PlanCache::new(0);
        assert!(!cache.is_enabled());
        assert_eq!("a", cache.insert(entry(&customers(), DialectKind::Generic, "a")).sql);
        assert!(cache.get(&customers(), &btreeset! {0}, DialectKind::Generic).is_none());
        assert!(cache.is_empty());
    }
}
